// src/gui.rs
use std::fs;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use eframe::egui;
use egui::{Color32, RichText};
use egui_plot::{Line, Plot, PlotBounds, PlotPoints};
use log::{error, info};

use crate::config::ScopeConfig;
use crate::engine::TransportHandle;
use crate::serial;
use crate::signal::channel::{X_SPAN_RANGE, Y_SPAN_RANGE};
use crate::signal::{render_scope_png, ChannelTag, PlotStyle, QueueSource, StatsSnapshot, UpdateLoop};
use crate::types::{ConnectionMode, TransportEvent};

const WINDOW_BG: Color32 = Color32::from_rgb(0x1e, 0x1e, 0x1e);
const TOGGLE_ON: Color32 = Color32::from_rgb(0x7e, 0x7e, 0x7e);
const TOGGLE_OFF: Color32 = Color32::from_rgb(0x4b, 0x4b, 0x4b);
const MAX_LOG_LINES: usize = 8;

pub struct ScopeApp {
    config: ScopeConfig,
    // 字段按声明顺序析构：先释放队列，再停止传输线程
    pipeline: UpdateLoop<QueueSource>,
    transport: Option<TransportHandle>,

    // 系统状态
    is_connected: bool,
    connection_mode: ConnectionMode,
    available_ports: Vec<String>,
    selected_port: String,

    // 界面日志
    log_messages: Vec<String>,

    // 通讯管道
    rx: Receiver<TransportEvent>,
    tx: Sender<TransportEvent>,
}

impl ScopeApp {
    pub fn new(config: ScopeConfig) -> Result<Self> {
        let mut pipeline = UpdateLoop::new(&config.pipeline)?;
        for tag in ChannelTag::ALL {
            *pipeline.zoom_mut(tag) = config.zoom();
        }
        let (tx, rx) = channel();
        let available_ports = serial::available_ports();
        let mut app = Self {
            connection_mode: config.connection_mode,
            selected_port: config.serial_port.clone(),
            config,
            pipeline,
            transport: None,
            is_connected: false,
            available_ports,
            log_messages: vec!["Dual-Screen Oscilloscope ready.".to_owned()],
            rx,
            tx,
        };
        // The device is opened at startup; failing here only leaves the plots idle.
        app.connect();
        Ok(app)
    }

    fn log(&mut self, msg: impl Into<String>) {
        self.log_messages.push(format!("> {}", msg.into()));
        if self.log_messages.len() > MAX_LOG_LINES {
            self.log_messages.remove(0);
        }
    }

    fn connect(&mut self) {
        match TransportHandle::open(
            &self.config,
            self.connection_mode,
            &self.selected_port,
            self.tx.clone(),
        ) {
            Ok((handle, source)) => {
                self.pipeline.attach(source);
                self.transport = Some(handle);
            }
            Err(err) => {
                error!("{err:#}");
                self.log(format!("❌ {err:#}"));
            }
        }
    }

    fn disconnect(&mut self) {
        // Release the queue first so a blocked producer wakes up.
        self.pipeline.detach();
        if let Some(mut handle) = self.transport.take() {
            handle.close();
            self.log(format!("🛑 Disconnected: {}", handle.description()));
        }
        self.is_connected = false;
    }

    fn refresh_ports(&mut self) {
        self.available_ports = serial::available_ports();
        if !self.available_ports.is_empty() && !self.available_ports.contains(&self.selected_port)
        {
            self.selected_port = self.available_ports[0].clone();
        }
        let msg = format!("Ports: {:?}", self.available_ports);
        self.log(msg);
    }

    fn export_png(&self) -> Result<String> {
        let png = render_scope_png(self.pipeline.frame(), PlotStyle::default())?;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let filename = format!("scope_{stamp}.png");
        fs::write(&filename, png).with_context(|| format!("failed to write {filename}"))?;
        Ok(filename)
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Dual-Screen Oscilloscope");
            ui.separator();
            let connected = self.transport.is_some();
            ui.add_enabled_ui(!connected, |ui| {
                ui.selectable_value(&mut self.connection_mode, ConnectionMode::Simulation, "SIM");
                ui.selectable_value(&mut self.connection_mode, ConnectionMode::Hardware, "REAL");
                egui::ComboBox::from_id_source("serial_port")
                    .selected_text(self.selected_port.clone())
                    .show_ui(ui, |ui| {
                        for port in &self.available_ports {
                            ui.selectable_value(&mut self.selected_port, port.clone(), port.as_str());
                        }
                    });
                if ui.button("🔄").on_hover_text("Rescan serial ports").clicked() {
                    self.refresh_ports();
                }
            });
            let btn_txt = if connected { "DISCONNECT" } else { "CONNECT" };
            if ui.button(btn_txt).clicked() {
                if connected {
                    self.disconnect();
                } else {
                    self.connect();
                }
            }
            if ui.button("💾 Save PNG").clicked() {
                match self.export_png() {
                    Ok(filename) => {
                        info!("saved {filename}");
                        self.log(format!("💾 Saved {filename}"));
                    }
                    Err(err) => {
                        error!("{err:#}");
                        self.log(format!("❌ {err:#}"));
                    }
                }
            }
            ui.separator();
            let status = if self.pipeline.transport_lost() {
                RichText::new("transport lost").color(Color32::YELLOW)
            } else if self.is_connected {
                RichText::new("streaming").color(Color32::GREEN)
            } else {
                RichText::new("no device").color(Color32::GRAY)
            };
            ui.label(status);
        });
    }

    fn show_channel(&mut self, ui: &mut egui::Ui, tag: ChannelTag) {
        let (title, color) = match tag {
            ChannelTag::A0 => ("Channel - 1", Color32::RED),
            ChannelTag::A1 => ("Channel - 2", Color32::BLUE),
        };
        let frame = self.pipeline.frame().channel(tag).clone();
        let zoom = self.pipeline.channel(tag).state().zoom;
        let (x_min, x_max) = zoom.x_bounds(frame.last_index());
        let (y_min, y_max) = zoom.y_bounds();

        ui.heading(title);
        ui.horizontal_top(|ui| {
            Plot::new(format!("plot_{tag}"))
                .view_aspect(1.4)
                .width((ui.available_width() - 150.0).max(200.0))
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .show(ui, |plot_ui| {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                        [x_min, y_min],
                        [x_max, y_max],
                    ));
                    plot_ui.line(
                        Line::new(PlotPoints::new(frame.points()))
                            .color(color)
                            .width(2.0)
                            .name(tag.to_string()),
                    );
                });
            ui.vertical(|ui| show_stats(ui, tag, &frame.stats));
        });

        let zoom = self.pipeline.zoom_mut(tag);
        ui.add(
            egui::Slider::new(&mut zoom.x_span, X_SPAN_RANGE.0..=X_SPAN_RANGE.1)
                .step_by(1.0)
                .text(format!("X-axis Zoom ({tag})")),
        );
        ui.add(
            egui::Slider::new(&mut zoom.y_span, Y_SPAN_RANGE.0..=Y_SPAN_RANGE.1)
                .step_by(1.0)
                .text(format!("Y-axis Zoom ({tag})")),
        );

        let fill = if frame.offset_correction {
            TOGGLE_ON
        } else {
            TOGGLE_OFF
        };
        let button = egui::Button::new(
            RichText::new(format!("Toggle Offset Correction {tag}")).color(Color32::WHITE),
        )
        .fill(fill);
        if ui.add(button).clicked() {
            let enabled = self.pipeline.toggle_offset_correction(tag);
            self.log(format!(
                "{tag} offset correction {}",
                if enabled { "on" } else { "off" }
            ));
        }
    }
}

fn show_stats(ui: &mut egui::Ui, tag: ChannelTag, stats: &StatsSnapshot) {
    egui::Grid::new(format!("stats_{tag}"))
        .num_columns(1)
        .spacing([10.0, 10.0])
        .show(ui, |ui| {
            let rows = [
                ("Amplitude", format!("{:.2}", stats.amplitude)),
                ("Frequency", format!("{:.2} Hz", stats.frequency)),
                ("Pk-to-Pk", format!("{:.2}", stats.peak_to_peak)),
                ("RMS", format!("{:.2}", stats.rms)),
                ("Mean", format!("{:.2}", stats.mean)),
                ("High", format!("{:.2}", stats.high)),
                ("Low", format!("{:.2}", stats.low)),
            ];
            for (label, value) in rows {
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(label).color(Color32::WHITE));
                    ui.label(RichText::new(value).color(Color32::WHITE).size(16.0));
                });
                ui.end_row();
            }
        });
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 传输线程消息
        while let Ok(event) = self.rx.try_recv() {
            match event {
                TransportEvent::Log(s) => self.log(s),
                TransportEvent::Status(b) => self.is_connected = b,
            }
        }

        // 2. 处理已缓冲的数据行
        self.pipeline.tick();

        // 3. UI 绘制
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = WINDOW_BG;
        ctx.set_visuals(visuals);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.show_toolbar(ui));

        egui::TopBottomPanel::bottom("log")
            .resizable(false)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(100.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for m in &self.log_messages {
                            ui.monospace(m);
                        }
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |columns| {
                for (column, tag) in columns.iter_mut().zip(ChannelTag::ALL) {
                    self.show_channel(column, tag);
                }
            });
        });

        ctx.request_repaint_after(self.config.tick_interval());
    }
}
