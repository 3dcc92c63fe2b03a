// src/app/ui/mod.rs
pub mod auth;
pub mod browse;
pub mod detail;
pub mod favorites;
pub mod grid;
pub mod topbar;

use eframe::egui as eg;

use crate::app::notify::ToastKind;
use crate::app::session::{gate, Gate, Route};

impl crate::app::CinedexApp {
    pub(crate) fn ui_root(&mut self, ctx: &eg::Context) {
        self.ui_render_navbar(ctx);

        eg::CentralPanel::default().show(ctx, |ui| {
            match gate(self.session.status(), &self.route) {
                Gate::Placeholder | Gate::Redirect(_) => self.ui_render_splash(ui),
                Gate::Render => match self.route.clone() {
                    Route::Home => self.ui_render_browse(ui, ctx),
                    Route::Favorites => self.ui_render_favorites(ui, ctx),
                    Route::Movie(_) => self.ui_render_detail(ui, ctx),
                    Route::Login => self.ui_render_login(ui),
                    Route::Register => self.ui_render_register(ui),
                },
            }
        });

        self.ui_render_toasts(ctx);
    }

    // Neutral placeholder while the session is being restored.
    pub(crate) fn ui_render_splash(&self, ui: &mut eg::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.add(eg::Spinner::new().size(24.0));
            ui.add_space(8.0);
            ui.label(eg::RichText::new("Loading…").weak());
        });
    }

    fn ui_render_toasts(&mut self, ctx: &eg::Context) {
        if self.toasts.items().is_empty() {
            return;
        }
        let mut dismiss = None;
        eg::Area::new(eg::Id::new("toasts"))
            .anchor(eg::Align2::RIGHT_BOTTOM, eg::vec2(-16.0, -16.0))
            .order(eg::Order::Foreground)
            .show(ctx, |ui| {
                for (i, toast) in self.toasts.items().iter().enumerate() {
                    let fill = match toast.kind {
                        ToastKind::Success => eg::Color32::from_rgb(34, 120, 60),
                        ToastKind::Info => eg::Color32::from_rgb(40, 90, 160),
                        ToastKind::Error => eg::Color32::from_rgb(160, 40, 40),
                    };
                    let resp = eg::Frame::none()
                        .fill(fill)
                        .rounding(6.0)
                        .inner_margin(eg::Margin::symmetric(12.0, 8.0))
                        .show(ui, |ui| {
                            ui.label(eg::RichText::new(&toast.text).color(eg::Color32::WHITE));
                        })
                        .response;
                    if resp
                        .interact(eg::Sense::click())
                        .on_hover_text("Dismiss")
                        .clicked()
                    {
                        dismiss = Some(i);
                    }
                    ui.add_space(6.0);
                }
            });
        if let Some(i) = dismiss {
            self.toasts.dismiss(i);
        }
    }
}
