//! Drawing requests emitted by the simulation for a host renderer. Nothing
//! here feeds back into simulation state.

use crate::math::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0);
    pub const YELLOW: Color = Color::new(1.0, 1.0, 0.0);
    pub const GRAY: Color = Color::new(0.5, 0.5, 0.5);
    pub const TEXT: Color = Color::new(0.8, 0.8, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

pub trait Annotator {
    fn line(&mut self, from: Vec3, to: Vec3, color: Color);

    /// Circle lying in the XZ plane.
    fn circle_xz(&mut self, center: Vec3, radius: f32, color: Color);

    fn text_at(&mut self, position: Vec3, text: &str, color: Color);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Line { from: Vec3, to: Vec3, color: Color },
    CircleXz { center: Vec3, radius: f32, color: Color },
    Text { position: Vec3, text: String, color: Color },
}

/// Records every request in order, for hosts that render after the tick.
#[derive(Clone, Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Annotator for DrawList {
    fn line(&mut self, from: Vec3, to: Vec3, color: Color) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn circle_xz(&mut self, center: Vec3, radius: f32, color: Color) {
        self.commands.push(DrawCommand::CircleXz {
            center,
            radius,
            color,
        });
    }

    fn text_at(&mut self, position: Vec3, text: &str, color: Color) {
        self.commands.push(DrawCommand::Text {
            position,
            text: text.to_string(),
            color,
        });
    }
}

/// Discards all drawing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAnnotation;

impl Annotator for NoAnnotation {
    fn line(&mut self, _from: Vec3, _to: Vec3, _color: Color) {}

    fn circle_xz(&mut self, _center: Vec3, _radius: f32, _color: Color) {}

    fn text_at(&mut self, _position: Vec3, _text: &str, _color: Color) {}
}
