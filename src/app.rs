use crate::config::Settings;
use crate::logic::{RandomPing, SharedStore, spawn_startup};
use crate::model::{Selector, ServerRecord, ServerStatus, StateView, Store};
use chrono::{DateTime, Local};
use eframe::egui;
use eframe::egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Plot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tr::tr;

const CARD_WIDTH: f32 = 220.0;

/// Runs once, on the first frame, with the board's store.
pub type StartupHook = Box<dyn FnOnce(SharedStore) + Send>;

/// Helper for application-specific colors adapted for light/dark themes.
struct StatusVisuals {
    pub is_dark: bool,
}

impl StatusVisuals {
    fn from_ctx(ctx: &egui::Context) -> Self {
        Self {
            is_dark: ctx.style().visuals.dark_mode,
        }
    }

    fn status_color(&self, status: ServerStatus) -> Color32 {
        match status {
            ServerStatus::Offline => Color32::from_rgb(213, 94, 0), // Vermilion
            ServerStatus::Maintenance => {
                if self.is_dark {
                    Color32::from_rgb(240, 228, 66) // Yellow
                } else {
                    Color32::from_rgb(230, 159, 0) // Orange
                }
            }
            ServerStatus::Online => {
                if self.is_dark {
                    Color32::from_rgb(86, 180, 233) // Sky Blue
                } else {
                    Color32::from_rgb(0, 114, 178) // Blue
                }
            }
        }
    }

    fn ping_color(&self, ping: Option<f64>) -> Color32 {
        match ping {
            None => {
                if self.is_dark {
                    Color32::from_gray(80)
                } else {
                    Color32::from_gray(160)
                }
            }
            Some(ms) if ms > 80.0 => Color32::from_rgb(204, 121, 167), // Reddish purple
            Some(ms) if ms > 50.0 => {
                if self.is_dark {
                    Color32::from_rgb(240, 228, 66)
                } else {
                    Color32::from_rgb(230, 159, 0)
                }
            }
            Some(_) => self.status_color(ServerStatus::Online),
        }
    }
}

/// Last time a view re-rendered. Moves only when the view's selection changes.
#[derive(Debug)]
struct RenderStamp {
    version: u64,
    at: DateTime<Local>,
}

impl RenderStamp {
    fn new() -> Self {
        Self {
            version: 0,
            at: Local::now(),
        }
    }

    fn observe(&mut self, version: u64) {
        if version != self.version {
            self.version = version;
            self.at = Local::now();
        }
    }

    fn label(&self) -> String {
        format!("{} ({})", self.at.format("%H:%M:%S"), self.at.timestamp_millis())
    }
}

/// Text shown after "Ping:", without the unit. The value is printed as stored, unrounded.
pub fn ping_text(ping: Option<f64>) -> String {
    match ping {
        Some(ms) => format!("{ms}"),
        None => "❌".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PingBar {
    name: String,
    ping: Option<f64>,
}

impl PingBar {
    /// Unset pings draw as an empty bar.
    fn height(&self) -> f64 {
        self.ping.unwrap_or(0.0)
    }
}

fn ping_bars(view: &StateView<'_>) -> Vec<PingBar> {
    view.server_ids()
        .iter()
        .map(|id| {
            let server = view.server(id);
            PingBar {
                name: server.map(|s| s.name.clone()).unwrap_or_default(),
                ping: server.and_then(|s| s.ping),
            }
        })
        .collect()
}

/// One server's card, subscribed to that server's record only.
struct ServerCard {
    record: Selector<Option<ServerRecord>>,
    rendered: RenderStamp,
}

impl ServerCard {
    fn new(store: &mut Store, id: &str) -> Self {
        let id = id.to_string();
        Self {
            record: store.select(move |view| view.server(&id).cloned()),
            rendered: RenderStamp::new(),
        }
    }

    fn show(&mut self, ui: &mut egui::Ui, visuals: &StatusVisuals) {
        let (record, version) = self.record.snapshot();
        self.rendered.observe(version);
        let Some(server) = record else {
            return;
        };

        let color = visuals.status_color(server.status);
        let rendered_at = self.rendered.label();

        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(2.0, color))
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.vertical(|ui| {
                    ui.heading(&server.name);
                    ui.colored_label(
                        color,
                        RichText::new(server.status.as_str()).monospace().strong(),
                    );
                    ui.small(format!("{}: {}", tr!("Rendered at"), rendered_at));
                    ui.label(format!("{}: {}", tr!("IP"), server.address));
                    ui.label(format!("{}: {}", tr!("Location"), server.location));
                    ui.label(format!("{}: {}", tr!("Uptime"), server.uptime));
                    ui.label(
                        RichText::new(format!(
                            "{}: {}{}",
                            tr!("Ping"),
                            ping_text(server.ping),
                            tr!("ms")
                        ))
                        .strong(),
                    );
                });
            });
    }
}

pub struct ServerBoard {
    store: SharedStore,
    server_ids: Selector<Vec<String>>,
    pings: Selector<Vec<PingBar>>,
    cards: HashMap<String, ServerCard>,
    startup: Option<StartupHook>,
    rendered: RenderStamp,
    ping_ceiling: f64,
}

impl ServerBoard {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let Settings {
            step_delay,
            ping_ceiling,
            servers,
        } = settings;

        let startup: StartupHook = Box::new(move |store: SharedStore| {
            spawn_startup(store, servers, step_delay, RandomPing::new(ping_ceiling));
        });

        let store = Arc::new(Mutex::new(Store::new()));
        Self::build(store, Some(startup), ping_ceiling, Some(cc.egui_ctx.clone()))
    }

    /// A board over an existing store that never runs a startup sequence.
    pub fn from_store(store: SharedStore) -> Self {
        Self::build(store, None, 100.0, None)
    }

    pub fn with_startup(store: SharedStore, startup: StartupHook) -> Self {
        Self::build(store, Some(startup), 100.0, None)
    }

    fn build(
        store: SharedStore,
        startup: Option<StartupHook>,
        ping_ceiling: f64,
        repaint: Option<egui::Context>,
    ) -> Self {
        let (server_ids, pings) = {
            let mut store = store.lock().expect("Failed to lock store for subscribing");
            let server_ids = store.select(|view| view.server_ids().to_vec());
            // Covers the order list and every record, so any change wakes the UI thread
            let pings = store.select_with(ping_bars, move || {
                if let Some(ctx) = &repaint {
                    ctx.request_repaint();
                }
            });
            (server_ids, pings)
        };

        Self {
            store,
            server_ids,
            pings,
            cards: HashMap::new(),
            startup,
            rendered: RenderStamp::new(),
            ping_ceiling,
        }
    }

    pub fn ui_layout(&mut self, ctx: &egui::Context) {
        if let Some(startup) = self.startup.take() {
            startup(self.store.clone());
        }

        let (server_ids, version) = self.server_ids.snapshot();
        self.rendered.observe(version);

        {
            let mut store = self.store.lock().expect("Failed to lock store for new cards");
            for id in &server_ids {
                self.cards
                    .entry(id.clone())
                    .or_insert_with(|| ServerCard::new(&mut store, id));
            }
        }

        let visuals = StatusVisuals::from_ctx(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading(tr!("Servers"));
                ui.small(format!("{}: {}", tr!("Board rendered at"), self.rendered.label()));
                ui.separator();

                if server_ids.is_empty() {
                    ui.label(tr!("Waiting for servers..."));
                    return;
                }

                self.ping_overview(ui, &visuals);
                ui.separator();

                ui.horizontal_wrapped(|ui| {
                    let mut seen: HashMap<&str, usize> = HashMap::new();
                    for id in &server_ids {
                        let occurrence = seen.entry(id.as_str()).or_default();
                        *occurrence += 1;
                        if let Some(card) = self.cards.get_mut(id) {
                            ui.push_id((id.as_str(), *occurrence), |ui| card.show(ui, &visuals));
                        }
                    }
                });
            });
        });
    }

    fn ping_overview(&self, ui: &mut egui::Ui, visuals: &StatusVisuals) {
        let bars = self.pings.get();
        let chart = BarChart::new(
            String::new(),
            bars.iter()
                .enumerate()
                .map(|(i, bar)| {
                    Bar::new(i as f64, bar.height())
                        .width(0.6)
                        .name(&bar.name)
                        .fill(visuals.ping_color(bar.ping))
                })
                .collect(),
        );

        Plot::new("ping_overview")
            .height(80.0)
            .show_axes(false)
            .show_grid(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .include_x(-0.5)
            .include_x(bars.len() as f64 - 0.5)
            .include_y(0.0)
            .include_y(self.ping_ceiling)
            .show(ui, |plot_ui: &mut egui_plot::PlotUi| {
                plot_ui.bar_chart(chart);
            });
    }
}

impl eframe::App for ServerBoard {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_layout(ctx);
    }
}
