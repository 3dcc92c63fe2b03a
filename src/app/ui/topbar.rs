// src/app/ui/topbar.rs
use eframe::egui as eg;

use crate::app::session::{Route, SessionStatus};

impl crate::app::CinedexApp {
    // ---------- NAVBAR ----------
    pub(crate) fn ui_render_navbar(&mut self, ctx: &eg::Context) {
        let mut go_to: Option<Route> = None;
        let mut toggle_theme = false;
        let mut logout = false;

        eg::TopBottomPanel::top("navbar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                let brand = ui.add(
                    eg::Label::new(eg::RichText::new("🎬 Cinedex").heading().strong())
                        .sense(eg::Sense::click()),
                );
                if brand.clicked() {
                    go_to = Some(Route::Home);
                }

                let authed = self.session.status() == SessionStatus::Authenticated;
                if authed {
                    ui.separator();
                    if ui
                        .selectable_label(self.route == Route::Home, "Movies")
                        .clicked()
                    {
                        go_to = Some(Route::Home);
                    }
                    let n = self.store.favorites().len();
                    let fav_label = if n > 0 {
                        format!("Favorites ({n})")
                    } else {
                        "Favorites".to_string()
                    };
                    if ui
                        .selectable_label(self.route == Route::Favorites, fav_label)
                        .clicked()
                    {
                        go_to = Some(Route::Favorites);
                    }
                }

                ui.with_layout(eg::Layout::right_to_left(eg::Align::Center), |ui| {
                    if authed {
                        if ui.button("Logout").clicked() {
                            logout = true;
                        }
                        if let Some(user) = &self.store.state().auth.user {
                            let who = if user.name.trim().is_empty() {
                                user.email.as_str()
                            } else {
                                user.name.as_str()
                            };
                            ui.label(eg::RichText::new(who).strong());
                        }
                    } else if self.route != Route::Login && ui.button("Login").clicked() {
                        go_to = Some(Route::Login);
                    }

                    let icon = if self.store.is_dark() { "☀" } else { "🌙" };
                    if ui.button(icon).on_hover_text("Toggle theme").clicked() {
                        toggle_theme = true;
                    }
                });
            });
            ui.add_space(4.0);
        });

        if toggle_theme {
            self.store.toggle_theme();
        }
        if logout {
            self.logout();
        } else if let Some(route) = go_to {
            self.navigate(route);
        }
    }
}
