use std::{
    fmt::Write as _,
    io::{self, Write as _},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Local;
use dashboard_core::{
    DashboardSnapshot, IconImage, PresentationSink, RevealFrame, RevealHandle, RevealPlan,
    spawn_reveal,
};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const HELP: &str = "Type a city + Enter to search | :c / :f / :u units | :r refresh | :q quit";
/// Icon "opacity", from hidden to fully drawn.
const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];
const BAR_WIDTH: f64 = 24.0;

/// Draws the dashboard to stdout, animating each new snapshot in.
pub struct TerminalSink {
    plan: RevealPlan,
    reveal: Option<RevealHandle>,
}

impl TerminalSink {
    pub fn new(plan: RevealPlan) -> Self {
        Self { plan, reveal: None }
    }

    fn cancel_reveal(&mut self) {
        if let Some(reveal) = self.reveal.take() {
            reveal.cancel();
        }
    }
}

#[async_trait]
impl PresentationSink for TerminalSink {
    async fn render(&mut self, snapshot: DashboardSnapshot) {
        self.cancel_reveal();

        let reveal = spawn_reveal(&self.plan, Arc::new(snapshot), |snapshot, frame| {
            let mut out = io::stdout().lock();
            let written = write!(out, "{CLEAR_SCREEN}{}\n{HELP}\n", draw_frame(snapshot, frame))
                .and_then(|_| out.flush());
            if let Err(e) = written {
                tracing::warn!("Failed to draw dashboard frame: {}", e);
            }
        });
        self.reveal = Some(reveal);
    }

    async fn render_error(&mut self, message: String) {
        // A reveal still playing would clear the screen over the message.
        self.cancel_reveal();
        println!("\n[!] {message}\n{HELP}");
    }

    async fn close(&mut self) {
        self.cancel_reveal();
    }
}

/// Text of the dashboard at one point of its reveal.
pub fn draw_frame(snapshot: &DashboardSnapshot, frame: RevealFrame) -> String {
    let mut out = String::new();
    let current = &snapshot.current;
    let units = snapshot.units;
    let symbol = units.symbol();

    let _ = writeln!(
        out,
        "{} {} - {}",
        icon_glyph(snapshot.current_icon(), &current.icon, frame.icon_opacity),
        current.location_name,
        capitalize(&current.description),
    );
    let _ = writeln!(
        out,
        "Temp: {:.1}{symbol} (Feels: {:.1}{symbol})",
        current.temperature, current.feels_like
    );
    let _ = writeln!(
        out,
        "Wind: {} {}  |  Humidity: {}%",
        current.wind_speed,
        units.speed_unit(),
        current.humidity_pct
    );
    let _ = writeln!(
        out,
        "Sunrise: {}  |  Sunset: {}",
        current.sunrise.with_timezone(&Local).format("%H:%M"),
        current.sunset.with_timezone(&Local).format("%H:%M"),
    );

    let _ = writeln!(out, "\nQuote of the moment\n  {}", snapshot.quote);

    if !snapshot.daily.is_empty() {
        let _ = writeln!(out, "\nForecast");
        let mut days = String::new();
        let mut icons = String::new();
        let mut ranges = String::new();
        for day in &snapshot.daily {
            let icon = icon_glyph(snapshot.icons.get(&day.icon), &day.icon, frame.icon_opacity);
            let _ = write!(days, "  {:<10}", day.weekday);
            let _ = write!(icons, "  {icon:<10}");
            let _ = write!(ranges, "  {:<10}", day.range_label);
        }
        let _ = writeln!(out, "{}\n{}\n{}", days.trim_end(), icons.trim_end(), ranges.trim_end());
    }

    if !snapshot.hourly.is_empty() {
        let _ = writeln!(out, "\nNext 12 hours ({symbol})");
        let (lo, hi) = snapshot.hourly.iter().fold((f64::MAX, f64::MIN), |(lo, hi), h| {
            (lo.min(h.temperature), hi.max(h.temperature))
        });

        for point in snapshot.hourly.iter().take(frame.trend_points) {
            let filled = if hi > lo {
                1 + ((point.temperature - lo) / (hi - lo) * (BAR_WIDTH - 1.0)).round() as usize
            } else {
                BAR_WIDTH as usize
            };
            let _ = writeln!(
                out,
                "  {}  {:>8}  {}",
                point.time_label,
                point.temperature_label,
                "█".repeat(filled)
            );
        }
    }

    out
}

fn icon_glyph(image: &IconImage, code: &str, opacity: f32) -> String {
    match image {
        IconImage::Placeholder => "[ ?? ]".to_string(),
        IconImage::Image(_) => {
            let level = (opacity.clamp(0.0, 1.0) * (SHADES.len() - 1) as f32).round() as usize;
            let shade = SHADES[level];
            format!("[{shade}{code}{shade}]")
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
