use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate};
use eframe::{App, CreationContext, Frame, egui};
use egui::{
    Align, Button, Color32, ComboBox, DragValue, Layout, RichText, ScrollArea, Sense, TextEdit, Ui,
    Vec2,
};
use egui_extras::{Column, TableBuilder};
use log::{info, warn};

mod heatmap;
mod models;
mod store;

use heatmap::{ActivityGrid, WEEK_WINDOW, build_grid};
use models::{EntryDraft, EntryLog};
use store::LogStore;

/// Cadence of the clock poll driving the header time and the day rollover.
const CLOCK_POLL: Duration = Duration::from_millis(500);

fn main() -> Result<(), eframe::Error> {
    // Keep the handle alive for the whole run; RUST_LOG overrides the level.
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.start())
        .map_err(|err| eprintln!("logging disabled: {err}"))
        .ok();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([440.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "liftlog",
        options,
        Box::new(|cc| Ok(Box::new(LiftLogApp::new(cc)))),
    )
}

struct LiftLogApp {
    log: EntryLog,
    store: LogStore,
    /// Cleared when the slot existed but could not be read at startup;
    /// flushing then would overwrite history this session never saw.
    writable: bool,
    draft: EntryDraft,
    grid: ActivityGrid,
    grid_revision: u64,
    grid_day: NaiveDate,
}

impl LiftLogApp {
    fn new(cc: &CreationContext) -> Self {
        cc.egui_ctx.set_style(nord_style());

        let store = LogStore::new(LogStore::default_path());
        let (log, writable) = match store.load() {
            Ok(log) => (log, true),
            Err(err) => {
                warn!("could not read {}, writes are off: {err}", store.path().display());
                (EntryLog::default(), false)
            }
        };
        info!("{} entries in {}", log.len(), store.path().display());

        let draft = log.last().map(EntryDraft::from_entry).unwrap_or_default();

        let now = Local::now();
        Self {
            grid: build_grid(log.entries(), now, WEEK_WINDOW),
            grid_revision: log.revision(),
            grid_day: now.date_naive(),
            log,
            store,
            writable,
            draft,
        }
    }

    /// The grid is derived state: rebuilt whenever the log changed or the
    /// calendar day rolled over, never incrementally patched.
    fn refresh_grid(&mut self, now: DateTime<Local>) {
        if self.grid_revision != self.log.revision() || self.grid_day != now.date_naive() {
            self.grid = build_grid(self.log.entries(), now, WEEK_WINDOW);
            self.grid_revision = self.log.revision();
            self.grid_day = now.date_naive();
        }
    }

    /// Full re-serialization after every mutation; a failed flush costs at
    /// most that one mutation, so the app keeps running. No flush happens
    /// at all while `writable` is off.
    fn flush(&mut self) {
        if !self.writable {
            warn!("not persisting, the stored log was unreadable at startup");
            return;
        }
        if let Err(err) = self.store.save(&self.log) {
            warn!("could not persist the log: {err}");
        }
    }
}

impl App for LiftLogApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        let now = Local::now();
        self.refresh_grid(now);

        egui::TopBottomPanel::top("overview").show(ctx, |ui| {
            ui.add_space(8.0);
            self.show_header(ui, now);
            ui.add_space(10.0);
            ui.with_layout(Layout::top_down(Align::Center), |ui| {
                self.show_heatmap(ui);
            });
            ui.add_space(10.0);
        });

        egui::TopBottomPanel::bottom("form").show(ctx, |ui| {
            ui.add_space(8.0);
            self.show_form(ui, now);
            ui.add_space(8.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_entries(ui);
        });

        // Keeps the clock and the day rollover fresh between input events.
        ctx.request_repaint_after(CLOCK_POLL);
    }
}

impl LiftLogApp {
    fn show_header(&mut self, ui: &mut Ui, now: DateTime<Local>) {
        ui.horizontal(|ui| {
            ui.label(
                RichText::new(now.format("%H:%M:%S").to_string())
                    .heading()
                    .size(34.0)
                    .strong(),
            );
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("Delete all data").clicked() {
                    self.log.clear();
                    self.flush();
                    info!("log cleared");
                }
            });
        });
        ui.label(RichText::new(now.format("%A, %B %e").to_string()).size(16.0));
    }

    fn show_heatmap(&mut self, ui: &mut Ui) {
        let cell = 13.0;
        let step = cell + 3.0;
        let size = Vec2::new(
            self.grid.columns() as f32 * step - 3.0,
            7.0 * step - 3.0,
        );
        let (response, painter) = ui.allocate_painter(size, Sense::hover());
        let origin = response.rect.min;
        let neutral = ui.visuals().faint_bg_color;

        for day in &self.grid.days {
            let corner = egui::pos2(
                origin.x + (day.col - 1) as f32 * step,
                origin.y + (day.row - 1) as f32 * step,
            );
            let rect = egui::Rect::from_min_size(corner, Vec2::splat(cell));
            let color = if day.set_count == 0 {
                neutral
            } else {
                activity_color(self.grid.intensity(day.set_count))
            };
            painter.rect_filled(rect, 2, color);
        }

        if let Some(pos) = response.hover_pos() {
            let col = ((pos.x - origin.x) / step).floor() as i64 + 1;
            let row = ((pos.y - origin.y) / step).floor() as i64 + 1;
            let hovered = self
                .grid
                .days
                .iter()
                .find(|d| i64::from(d.col) == col && i64::from(d.row) == row);
            if let Some(day) = hovered {
                response.on_hover_text(format!(
                    "{} sets on {}",
                    day.set_count,
                    day.date.format("%a %b %e")
                ));
            }
        }
    }

    fn show_entries(&mut self, ui: &mut Ui) {
        let mut remove = None;

        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            if self.log.is_empty() {
                ui.add_space(16.0);
                ui.label(RichText::new("No sets logged yet.").size(16.0).weak());
                return;
            }

            let entries = self.log.entries();
            let mut start = 0;
            while start < entries.len() {
                let day = entries[start].date.date_naive();
                let run = entries[start..]
                    .iter()
                    .take_while(|e| e.date.date_naive() == day)
                    .count();

                ui.add_space(10.0);
                ui.label(
                    RichText::new(entries[start].date.format("%a %b %e %Y").to_string())
                        .size(18.0)
                        .strong(),
                );

                ui.push_id(day, |ui| {
                    TableBuilder::new(ui)
                        .striped(true)
                        .column(Column::remainder())
                        .column(Column::auto())
                        .column(Column::auto())
                        .column(Column::auto())
                        .column(Column::exact(22.0))
                        .body(|mut body| {
                            for idx in start..start + run {
                                let entry = &entries[idx];
                                body.row(22.0, |mut row| {
                                    row.col(|ui| {
                                        ui.label(&entry.name);
                                    });
                                    row.col(|ui| {
                                        ui.label(format!("{}x", entry.reps));
                                    });
                                    row.col(|ui| {
                                        ui.label(format!("{}kg", entry.weight));
                                    });
                                    row.col(|ui| {
                                        ui.label(format!("rpe {}", entry.rpe));
                                    });
                                    row.col(|ui| {
                                        if ui.small_button("✕").clicked() {
                                            remove = Some(idx);
                                        }
                                    });
                                });
                            }
                        });
                });

                start += run;
            }
        });

        if let Some(index) = remove {
            match self.log.remove_at(index) {
                Ok(entry) => {
                    info!("removed {} ({}x{}kg)", entry.name, entry.reps, entry.weight);
                    self.flush();
                }
                Err(err) => warn!("remove rejected: {err}"),
            }
        }
    }

    fn show_form(&mut self, ui: &mut Ui, now: DateTime<Local>) {
        let status = self.draft.build(now);

        ui.horizontal(|ui| {
            ui.add(
                TextEdit::singleline(&mut self.draft.name)
                    .hint_text("exercise")
                    .desired_width(150.0),
            );
            ui.add(DragValue::new(&mut self.draft.reps).range(0..=200).suffix("x"));
            ui.add(
                DragValue::new(&mut self.draft.weight)
                    .range(0.0..=2000.0)
                    .speed(2.5)
                    .max_decimals(1)
                    .suffix("kg"),
            );

            let selected = match self.draft.rpe {
                Some(rpe) => format!("rpe {rpe}"),
                None => "rpe".to_string(),
            };
            ComboBox::from_id_salt("rpe")
                .width(70.0)
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for value in 1..=10 {
                        ui.selectable_value(&mut self.draft.rpe, Some(value), value.to_string());
                    }
                });

            if ui.add_enabled(status.is_ok(), Button::new("Add")).clicked() {
                match self.log.append(&self.draft, now) {
                    // The draft stays filled in for the next set.
                    Ok(()) => self.flush(),
                    Err(err) => warn!("append rejected: {err}"),
                }
            }
        });

        if let Err(err) = status {
            ui.label(
                RichText::new(err.to_string())
                    .color(ui.visuals().warn_fg_color)
                    .small(),
            );
        }
    }
}

/// Dark look on the Nord palette: polar-night surfaces with snow-storm
/// text and a frost accent.
fn nord_style() -> egui::Style {
    let polar0 = Color32::from_rgb(46, 52, 64);
    let polar1 = Color32::from_rgb(59, 66, 82);
    let polar2 = Color32::from_rgb(67, 76, 94);
    let polar3 = Color32::from_rgb(76, 86, 106);
    let snow = Color32::from_rgb(216, 222, 233);
    let frost = Color32::from_rgb(94, 129, 172);

    let mut style = egui::Style::default();
    style.visuals = egui::Visuals::dark();
    style.visuals.override_text_color = Some(snow);
    style.visuals.panel_fill = polar0;
    style.visuals.window_fill = polar0;
    style.visuals.extreme_bg_color = polar1;
    style.visuals.faint_bg_color = polar1;
    style.visuals.selection.bg_fill = frost;
    style.visuals.widgets.noninteractive.bg_fill = polar0;
    style.visuals.widgets.inactive.bg_fill = polar2;
    style.visuals.widgets.inactive.weak_bg_fill = polar2;
    style.visuals.widgets.hovered.bg_fill = polar3;
    style.visuals.widgets.hovered.weak_bg_fill = polar3;
    style.visuals.widgets.active.bg_fill = frost;
    style.visuals.widgets.active.weak_bg_fill = frost;
    style
}

/// A green at hue 123 whose lightness falls as the day's share of the
/// single-day maximum rises. Zero-count days never reach this; they take
/// the neutral theme color.
fn activity_color(intensity: f32) -> Color32 {
    hsl_color(123.0, 1.0, 0.40 - 0.22 * intensity)
}

/// hue in degrees, saturation and lightness in 0..=1, as in CSS hsl().
fn hsl_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = lightness - c / 2.0;
    Color32::from_rgb(
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_style_is_a_dark_nord_palette() {
        let style = nord_style();

        assert!(style.visuals.dark_mode);
        assert_eq!(style.visuals.panel_fill, Color32::from_rgb(46, 52, 64));
        assert_eq!(
            style.visuals.override_text_color,
            Some(Color32::from_rgb(216, 222, 233))
        );
        // The neutral heatmap cell must stand out against the panel.
        assert_ne!(style.visuals.faint_bg_color, style.visuals.panel_fill);
    }

    #[test]
    fn activity_shading_darkens_from_the_base_green() {
        // hsl(123, 100%, 40%) and hsl(123, 100%, 18%).
        assert_eq!(activity_color(0.0), Color32::from_rgb(0, 204, 10));
        assert_eq!(activity_color(1.0), Color32::from_rgb(0, 92, 5));
    }
}
