use svg::node::element::{Rectangle, Text};
use svg::Document;

pub struct BarStyle {
    pub fill_color: &'static str,
    pub label_color: &'static str,
}

pub const DEFAULT_STYLE: BarStyle = BarStyle {
    fill_color: "#4A90E2",
    label_color: "#333333",
};

/// Horizontal bar chart, one bar per label, scaled to the largest value.
pub struct Renderer {
    pub width: i32,
    pub bar_height: i32,
    pub label_width: i32,
    margin: i32,
}

impl Renderer {
    pub fn new(width: i32, bar_height: i32, label_width: i32, margin: i32) -> Self {
        Self {
            width,
            bar_height,
            label_width,
            margin,
        }
    }

    fn bar_length(&self, value: usize, max_value: usize) -> f64 {
        if max_value == 0 {
            0.0
        } else {
            value as f64 / max_value as f64 * (self.width - self.label_width) as f64
        }
    }

    pub fn render_bar_chart(&self, bars: &[(&str, usize)], style: &BarStyle) -> String {
        let height = bars.len() as i32 * self.bar_height;
        let max_value = bars.iter().map(|(_, value)| *value).max().unwrap_or(0);

        let mut document = Document::new()
            .set(
                "viewBox",
                (-self.margin, -self.margin, self.width + 2 * self.margin, height + 2 * self.margin),
            )
            .set("width", self.width + 2 * self.margin)
            .set("height", height + 2 * self.margin);

        for (row, (label, value)) in bars.iter().enumerate() {
            let y = row as i32 * self.bar_height;
            document = document
                .add(self.get_label(label, y, style.label_color))
                .add(self.get_bar(self.bar_length(*value, max_value), y, style.fill_color))
                .add(self.get_value(*value, y, style.label_color));
        }

        document.to_string()
    }

    fn text_baseline(&self, y: i32) -> f64 {
        y as f64 + self.bar_height as f64 * 0.7
    }

    fn get_label(&self, label: &str, y: i32, color: &str) -> Text {
        Text::new(label)
            .set("x", 0)
            .set("y", self.text_baseline(y))
            .set("fill", color)
            .set("font-size", "12")
    }

    fn get_bar(&self, length: f64, y: i32, color: &str) -> Rectangle {
        Rectangle::new()
            .set("x", self.label_width)
            .set("y", y as f64 + self.bar_height as f64 * 0.15)
            .set("width", length)
            .set("height", self.bar_height as f64 * 0.7)
            .set("fill", color)
    }

    fn get_value(&self, value: usize, y: i32, color: &str) -> Text {
        Text::new(value.to_string())
            .set("x", self.width)
            .set("y", self.text_baseline(y))
            .set("fill", color)
            .set("font-size", "12")
            .set("text-anchor", "end")
    }
}
