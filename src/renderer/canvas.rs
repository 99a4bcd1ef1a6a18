//! Canvas2D backend (WASM only)

use std::collections::HashMap;

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::{Align, Color, DrawCmd, DrawList, Renderer};
use crate::RenderError;
use crate::assets::SpriteId;
use crate::consts::PLAY_HEIGHT;

fn css(color: Color) -> String {
    format!(
        "rgba({}, {}, {}, {:.3})",
        (color[0] * 255.0) as u8,
        (color[1] * 255.0) as u8,
        (color[2] * 255.0) as u8,
        color[3]
    )
}

fn backend(e: JsValue) -> RenderError {
    RenderError::Backend(format!("{:?}", e))
}

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    /// Images that finished loading
    images: HashMap<SpriteId, HtmlImageElement>,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, RenderError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(backend)?
            .ok_or_else(|| RenderError::Backend("2d context unavailable".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| RenderError::Backend("not a 2d context".into()))?;
        log::info!("Canvas renderer ready ({}x{})", canvas.width(), canvas.height());
        Ok(Self {
            canvas,
            ctx,
            images: HashMap::new(),
        })
    }

    /// Make a loaded image drawable
    pub fn register_image(&mut self, id: SpriteId, image: HtmlImageElement) {
        self.images.insert(id, image);
    }

    /// Run `draw` translated to `center` and rotated. The context state is restored on every path.
    fn transformed(
        &self,
        center: Vec2,
        rotation: f32,
        draw: impl FnOnce(&CanvasRenderingContext2d) -> Result<(), JsValue>,
    ) -> Result<(), RenderError> {
        let ctx = &self.ctx;
        ctx.save();
        let result = ctx
            .translate(center.x as f64, center.y as f64)
            .and_then(|_| ctx.rotate(rotation as f64))
            .and_then(|_| draw(ctx));
        ctx.restore();
        result.map_err(backend)
    }

    /// Uniform scale from play-area units to canvas pixels
    fn scale(&self) -> f64 {
        self.canvas.height() as f64 / PLAY_HEIGHT as f64
    }

    fn draw_cmd(&self, cmd: &DrawCmd) -> Result<(), RenderError> {
        let ctx = &self.ctx;
        match cmd {
            DrawCmd::Rect { rect, color } => {
                ctx.set_fill_style_str(&css(*color));
                ctx.fill_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
            }
            DrawCmd::Quad {
                center,
                size,
                rotation,
                color,
            } => {
                self.transformed(*center, *rotation, |ctx| {
                    ctx.set_fill_style_str(&css(*color));
                    ctx.fill_rect(
                        -size.x as f64 / 2.0,
                        -size.y as f64 / 2.0,
                        size.x as f64,
                        size.y as f64,
                    );
                    Ok(())
                })?;
            }
            DrawCmd::Sprite {
                id,
                rect,
                rotation,
                alpha,
            } => {
                // Registered in the asset store but not yet handed to us
                let Some(image) = self.images.get(id) else {
                    return Ok(());
                };
                self.transformed(rect.center(), *rotation, |ctx| {
                    ctx.set_global_alpha(*alpha as f64);
                    ctx.draw_image_with_html_image_element_and_dw_and_dh(
                        image,
                        -rect.w as f64 / 2.0,
                        -rect.h as f64 / 2.0,
                        rect.w as f64,
                        rect.h as f64,
                    )
                })?;
            }
            DrawCmd::Line {
                from,
                to,
                width,
                color,
            } => {
                ctx.set_stroke_style_str(&css(*color));
                ctx.set_line_width(*width as f64);
                ctx.begin_path();
                ctx.move_to(from.x as f64, from.y as f64);
                ctx.line_to(to.x as f64, to.y as f64);
                ctx.stroke();
            }
            DrawCmd::Text {
                text,
                pos,
                size,
                color,
                align,
            } => {
                ctx.set_font(&format!("bold {}px monospace", size));
                ctx.set_text_align(match align {
                    Align::Left => "left",
                    Align::Center => "center",
                });
                ctx.set_text_baseline("middle");
                ctx.set_fill_style_str(&css(*color));
                ctx.fill_text(text, pos.x as f64, pos.y as f64).map_err(backend)?;
            }
            DrawCmd::Overlay { color } => {
                ctx.set_fill_style_str(&css(*color));
                ctx.fill_rect(
                    0.0,
                    0.0,
                    self.canvas.width() as f64 / self.scale(),
                    PLAY_HEIGHT as f64,
                );
            }
        }
        Ok(())
    }
}

impl Renderer for CanvasRenderer {
    fn draw(&mut self, frame: &DrawList) -> Result<(), RenderError> {
        if self.canvas.width() == 0 || self.canvas.height() == 0 {
            return Err(RenderError::SurfaceLost);
        }
        let scale = self.scale();
        let ctx = &self.ctx;
        ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).map_err(backend)?;
        ctx.clear_rect(0.0, 0.0, self.canvas.width() as f64, self.canvas.height() as f64);
        ctx.scale(scale, scale).map_err(backend)?;
        ctx.set_global_alpha(1.0);

        for cmd in &frame.cmds {
            self.draw_cmd(cmd)?;
        }
        Ok(())
    }
}
