//! Per-frame command encoding and the globe render pass.

use crate::depth::DepthBuffer;

/// Background used until a colour is configured.
pub const DEFAULT_BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

/// Describes the colour clear and optional depth attachment of a pass.
#[derive(Debug, Clone, Copy)]
pub struct RenderPassBuilder {
    clear_color: wgpu::Color,
    depth: bool,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPassBuilder {
    pub fn new() -> Self {
        Self {
            clear_color: DEFAULT_BACKGROUND,
            depth: false,
            label: None,
        }
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Clear and test against the reverse-Z depth buffer.
    pub fn with_depth(mut self) -> Self {
        self.depth = true;
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    fn begin<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        color_view: &'e wgpu::TextureView,
        depth: Option<&'e DepthBuffer>,
    ) -> wgpu::RenderPass<'e> {
        let depth_stencil_attachment = depth.filter(|_| self.depth).map(|depth| wgpu::RenderPassDepthStencilAttachment {
            view: &depth.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// One acquired surface frame and the encoder recording into it.
///
/// Dropping without [`submit`](Self::submit) discards the frame.
pub struct FrameEncoder<'q> {
    encoder: wgpu::CommandEncoder,
    queue: &'q wgpu::Queue,
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

impl<'q> FrameEncoder<'q> {
    pub fn new(device: &wgpu::Device, queue: &'q wgpu::Queue, surface_texture: wgpu::SurfaceTexture) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame-encoder"),
        });
        let view = surface_texture.texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            encoder,
            queue,
            surface_texture,
            view,
        }
    }

    pub fn begin_render_pass<'a>(
        &'a mut self,
        builder: &RenderPassBuilder,
        depth: Option<&'a DepthBuffer>,
    ) -> wgpu::RenderPass<'a> {
        builder.begin(&mut self.encoder, &self.view, depth)
    }

    /// Submit the recorded commands and present.
    pub fn submit(self) {
        self.queue.submit([self.encoder.finish()]);
        self.surface_texture.present();
    }
}

/// Convert an sRGB colour in `[0, 1]` to the linear value a clear expects.
#[must_use]
pub fn clear_color(rgba: [f64; 4]) -> wgpu::Color {
    let linear = |c: f64| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    wgpu::Color {
        r: linear(rgba[0]),
        g: linear(rgba[1]),
        b: linear(rgba[2]),
        a: rgba[3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = RenderPassBuilder::new();
        assert_eq!(builder.clear_color, DEFAULT_BACKGROUND);
        assert!(!builder.depth);
        assert_eq!(builder.label, None);
    }

    #[test]
    fn test_builder_options() {
        let builder = RenderPassBuilder::new()
            .clear_color(wgpu::Color::RED)
            .with_depth()
            .label("globe");
        assert_eq!(builder.clear_color, wgpu::Color::RED);
        assert!(builder.depth);
        assert_eq!(builder.label, Some("globe"));
    }

    #[test]
    fn test_clear_color_linearises() {
        let white = clear_color([1.0, 1.0, 1.0, 1.0]);
        assert!((white.r - 1.0).abs() < 1e-9);
        let grey = clear_color([0.5, 0.5, 0.5, 1.0]);
        assert!((grey.g - 0.214).abs() < 1e-3, "mid grey is darker in linear space: {}", grey.g);
        assert_eq!(clear_color([0.0, 0.0, 0.0, 0.25]).a, 0.25);
    }
}
