use crate::analysis::{FrameAnnotations, Landmark, LeanClass};

use super::skeleton::{visible_bones, LEFT_HIP, NOSE, RIGHT_HIP};

pub const LANDMARK_RADIUS: f32 = 3.0;
pub const LINE_WIDTH: f32 = 2.0;
pub const TEXT_SIZE: f32 = 12.0;
pub const DEFAULT_BOUNCE_THRESHOLD: f64 = 0.08;

/// Pixel size of the rendered video the overlay is aligned to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A 16:9 surface as wide as `width`.
    pub fn widescreen(width: f32) -> Self {
        Self::new(width, width * 9.0 / 16.0)
    }

    fn x(&self, normalized: f64) -> f32 {
        normalized as f32 * self.width
    }

    fn y(&self, normalized: f64) -> f32 {
        normalized as f32 * self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayColor {
    Red,
    Green,
    Blue,
    Black,
    Purple,
}

impl OverlayColor {
    pub fn name(&self) -> &'static str {
        match self {
            OverlayColor::Red => "red",
            OverlayColor::Green => "green",
            OverlayColor::Blue => "blue",
            OverlayColor::Black => "black",
            OverlayColor::Purple => "purple",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle {
        center: Point,
        radius: f32,
        color: OverlayColor,
    },
    Line {
        from: Point,
        to: Point,
        width: f32,
        color: OverlayColor,
    },
    Text {
        anchor: Point,
        text: String,
        size: f32,
        bold: bool,
        color: OverlayColor,
    },
}

/// What a shape annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayElement {
    Landmark(usize),
    Bone(usize, usize),
    GroundLine,
    HipDrop,
    BodyLean,
    LandingSummary,
    VerticalBounce,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayItem {
    pub element: OverlayElement,
    pub shape: Shape,
}

pub fn bounce_color(bounce: f64, threshold: f64) -> OverlayColor {
    if bounce <= threshold {
        OverlayColor::Blue
    } else {
        OverlayColor::Red
    }
}

pub fn lean_color(class: LeanClass) -> OverlayColor {
    match class {
        LeanClass::Leaning => OverlayColor::Red,
        LeanClass::Neutral => OverlayColor::Green,
    }
}

pub fn hip_drop_label(significant: bool) -> &'static str {
    if significant {
        "Hip Dropped"
    } else {
        "No Hip Drop"
    }
}

/// Turns one frame of analysis into shapes in viewport pixels.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    viewport: Viewport,
    bounce_threshold: f64,
}

impl OverlayRenderer {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            bounce_threshold: DEFAULT_BOUNCE_THRESHOLD,
        }
    }

    pub fn with_bounce_threshold(mut self, threshold: f64) -> Self {
        self.bounce_threshold = threshold;
        self
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn point(&self, landmark: &Landmark) -> Point {
        Point::new(self.viewport.x(landmark.x), self.viewport.y(landmark.y))
    }

    fn text(&self, element: OverlayElement, anchor: Point, text: String, color: OverlayColor) -> OverlayItem {
        OverlayItem {
            element,
            shape: Shape::Text {
                anchor,
                text,
                size: TEXT_SIZE,
                bold: true,
                color,
            },
        }
    }

    pub fn render(&self, frame: &FrameAnnotations<'_>, most_frequent_landing: Option<&str>) -> Vec<OverlayItem> {
        let mut items = Vec::new();
        let landmarks = frame.landmarks;

        for (index, landmark) in landmarks.iter() {
            items.push(OverlayItem {
                element: OverlayElement::Landmark(index),
                shape: Shape::Circle {
                    center: self.point(landmark),
                    radius: LANDMARK_RADIUS,
                    color: OverlayColor::Red,
                },
            });
        }

        for ((start, end), a, b) in visible_bones(landmarks) {
            items.push(OverlayItem {
                element: OverlayElement::Bone(start, end),
                shape: Shape::Line {
                    from: self.point(a),
                    to: self.point(b),
                    width: LINE_WIDTH,
                    color: OverlayColor::Green,
                },
            });
        }

        if let Some(ground) = frame.landing.ground_assump {
            let y = self.viewport.y(ground);
            items.push(OverlayItem {
                element: OverlayElement::GroundLine,
                shape: Shape::Line {
                    from: Point::new(0.0, y),
                    to: Point::new(self.viewport.width, y),
                    width: LINE_WIDTH,
                    color: OverlayColor::Blue,
                },
            });
        }

        // Labels hang off the hips and nose; a missing landmark pins them to the edge.
        let hip_x = landmarks
            .get(LEFT_HIP)
            .map_or(0.0, |lm| self.viewport.x(lm.x));
        let hip_y = landmarks
            .get(RIGHT_HIP)
            .map_or(0.0, |lm| self.viewport.y(lm.y));

        items.push(self.text(
            OverlayElement::HipDrop,
            Point::new(hip_x + 30.0, hip_y - 5.0),
            hip_drop_label(frame.hip_drop.significant).to_string(),
            OverlayColor::Black,
        ));

        if let Some(text) = frame.body_lean.text.as_deref().filter(|t| !t.is_empty()) {
            let nose = landmarks.get(NOSE);
            let anchor = Point::new(
                nose.map_or(0.0, |lm| self.viewport.x(lm.x)) + 10.0,
                nose.map_or(0.0, |lm| self.viewport.y(lm.y)),
            );
            items.push(self.text(
                OverlayElement::BodyLean,
                anchor,
                format!("{} - {:.2}°", text, frame.body_lean.angle),
                lean_color(frame.body_lean.classify()),
            ));
        }

        if let Some(landing) = most_frequent_landing {
            items.push(self.text(
                OverlayElement::LandingSummary,
                Point::new(hip_x + 30.0, hip_y + 30.0),
                landing.to_string(),
                OverlayColor::Purple,
            ));
        }

        items.push(self.text(
            OverlayElement::VerticalBounce,
            Point::new(self.viewport.width / 6.0, self.viewport.height - 190.0),
            format!("Vertical Bounce: {:.2}", frame.vertical_bounce),
            bounce_color(frame.vertical_bounce, self.bounce_threshold),
        ));

        items
    }
}
