// src/app/ui/detail.rs
use eframe::egui as eg;
use egui_extras::{Size, StripBuilder};

use super::grid::{paint_image, CardAction};
use crate::app::detail::{CreditsView, Slot};
use crate::app::prefetch::MAX_UPLOADS_PER_FRAME;
use crate::app::session::Route;
use crate::app::types::{Credit, Movie, MovieDetails};
use crate::app::utils::{format_rating, format_runtime, release_year};

const POSTER_W: f32 = 240.0;
const BACKDROP_H: f32 = 200.0;
const PROFILE_W: f32 = 90.0;

impl crate::app::CinedexApp {
    pub(crate) fn ui_render_detail(&mut self, ui: &mut eg::Ui, ctx: &eg::Context) {
        if ui.button("← Back to movies").clicked() {
            self.navigate(Route::Home);
            return;
        }
        ui.add_space(6.0);

        let Some(state) = self.detail.as_ref() else {
            self.ui_render_splash(ui);
            return;
        };
        let details = match state.details() {
            Slot::Loading => {
                self.ui_render_splash(ui);
                return;
            }
            Slot::Failed(err) => {
                let mut retry = false;
                ui.vertical_centered(|ui| {
                    ui.add_space(60.0);
                    ui.heading("Movie not found");
                    ui.label(eg::RichText::new(err).weak());
                    ui.add_space(8.0);
                    retry = ui.button("Retry").clicked();
                });
                if retry {
                    self.retry_detail();
                }
                return;
            }
            Slot::Ready(d) => d.clone(),
        };
        let similar = state.similar().clone();
        let credits = state.credits().clone();

        let action = eg::ScrollArea::vertical()
            .id_source(("detail_scroll", details.id.as_str()))
            .auto_shrink([false; 2])
            .show(ui, |ui| self.ui_detail_body(ui, ctx, &details, &similar, &credits))
            .inner;
        self.handle_card_action(action);
    }

    fn ui_detail_body(
        &mut self,
        ui: &mut eg::Ui,
        ctx: &eg::Context,
        d: &MovieDetails,
        similar: &Slot<Vec<Movie>>,
        credits: &Slot<CreditsView>,
    ) -> Option<CardAction> {
        let mut uploads_left = MAX_UPLOADS_PER_FRAME;

        // backdrop
        if d.backdrop_path.is_some() {
            let url = self.images.backdrop(d.backdrop_path.as_deref());
            let (rect, _) = ui.allocate_exact_size(
                eg::vec2(ui.available_width(), BACKDROP_H),
                eg::Sense::hover(),
            );
            if let Some(tex) = self.posters.texture(ctx, &url, &mut uploads_left) {
                // crop the middle band so the image keeps its aspect
                let [tw, th] = tex.size_vec2().into();
                let want = (rect.height() / rect.width()) * tw / th.max(1.0);
                let v0 = ((1.0 - want) * 0.5).clamp(0.0, 0.5);
                ui.painter().image(
                    tex.id(),
                    rect,
                    eg::Rect::from_min_max(eg::pos2(0.0, v0), eg::pos2(1.0, 1.0 - v0)),
                    eg::Color32::from_white_alpha(120),
                );
            } else {
                ui.painter()
                    .rect_filled(rect, 0.0, eg::Color32::from_gray(30));
            }
            ui.add_space(12.0);
        }

        // poster | header
        let mut toggle_fav = false;
        let is_fav = self.store.is_favorite(&d.id);
        let poster_url = self.images.poster(d.poster_path.as_deref());
        let poster_tex = self.posters.texture(ctx, &poster_url, &mut uploads_left);
        let poster_failed = self.posters.is_failed(&poster_url);

        ui.allocate_ui(eg::vec2(ui.available_width(), POSTER_W * 1.5), |ui| {
            StripBuilder::new(ui)
                .size(Size::exact(POSTER_W))
                .size(Size::remainder().at_least(240.0))
                .horizontal(|mut strip| {
                    strip.cell(|ui| {
                        let (rect, _) = ui.allocate_exact_size(
                            eg::vec2(POSTER_W, POSTER_W * 1.5),
                            eg::Sense::hover(),
                        );
                        paint_image(ui.painter(), rect, poster_tex.as_ref(), poster_failed);
                    });
                    strip.cell(|ui| {
                        ui.add_space(4.0);
                        ui.heading(eg::RichText::new(&d.title).size(26.0).strong());

                        let mut facts: Vec<String> = Vec::new();
                        if let Some(y) = release_year(d.release_date.as_deref()) {
                            facts.push(y.to_string());
                        }
                        if let Some(m) = d.runtime.filter(|m| *m > 0) {
                            facts.push(format_runtime(m));
                        }
                        facts.push(format!("★ {}", format_rating(d.vote_average)));
                        ui.label(eg::RichText::new(facts.join("  •  ")).weak());

                        if !d.genres.is_empty() {
                            ui.add_space(6.0);
                            ui.horizontal_wrapped(|ui| {
                                for g in &d.genres {
                                    eg::Frame::none()
                                        .fill(ui.visuals().faint_bg_color)
                                        .rounding(10.0)
                                        .inner_margin(eg::Margin::symmetric(8.0, 3.0))
                                        .show(ui, |ui| {
                                            ui.label(eg::RichText::new(&g.name).size(12.0));
                                        });
                                }
                            });
                        }

                        ui.add_space(10.0);
                        if let Some(overview) = d.overview.as_deref().filter(|o| !o.is_empty()) {
                            ui.label(eg::RichText::new("Overview").strong());
                            ui.label(overview);
                        }

                        ui.add_space(10.0);
                        let label = if is_fav {
                            "❤ Remove from Favorites"
                        } else {
                            "♡ Add to Favorites"
                        };
                        if ui.button(label).clicked() {
                            toggle_fav = true;
                        }
                    });
                });
        });
        if toggle_fav {
            self.toggle_favorite(&d.to_movie());
        }

        ui.add_space(16.0);
        self.ui_detail_credits(ui, ctx, credits, &mut uploads_left);

        ui.add_space(16.0);
        ui.separator();
        ui.heading("Similar Movies");
        ui.add_space(6.0);
        match similar {
            Slot::Loading => {
                ui.add(eg::Spinner::new());
                None
            }
            Slot::Failed(_) => {
                ui.label(eg::RichText::new("Similar movies are unavailable").weak());
                None
            }
            Slot::Ready(list) if list.is_empty() => {
                ui.label(eg::RichText::new("No similar movies").weak());
                None
            }
            Slot::Ready(list) => self.ui_movie_grid(ui, ctx, list, "similar_grid"),
        }
    }

    fn ui_detail_credits(
        &mut self,
        ui: &mut eg::Ui,
        ctx: &eg::Context,
        credits: &Slot<CreditsView>,
        uploads_left: &mut usize,
    ) {
        ui.heading("Cast");
        ui.add_space(6.0);
        let c = match credits {
            Slot::Loading => {
                ui.add(eg::Spinner::new());
                return;
            }
            Slot::Failed(_) => {
                ui.label(eg::RichText::new("Cast and crew are unavailable").weak());
                return;
            }
            Slot::Ready(c) => c,
        };

        eg::ScrollArea::horizontal()
            .id_source("cast_row")
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    for person in &c.cast {
                        self.ui_cast_card(ui, ctx, person, uploads_left);
                    }
                });
            });

        if !c.crew.is_empty() {
            ui.add_space(12.0);
            ui.heading("Crew");
            eg::Grid::new("crew_grid")
                .num_columns(2)
                .spacing([24.0, 4.0])
                .show(ui, |ui| {
                    for member in &c.crew {
                        ui.label(eg::RichText::new(&member.name).strong());
                        ui.label(member.job.as_deref().unwrap_or_default());
                        ui.end_row();
                    }
                });
        }
    }

    fn ui_cast_card(
        &mut self,
        ui: &mut eg::Ui,
        ctx: &eg::Context,
        person: &Credit,
        uploads_left: &mut usize,
    ) {
        let url = self.images.profile(person.profile_path.as_deref());
        let tex = self.posters.texture(ctx, &url, uploads_left);
        let failed = self.posters.is_failed(&url);
        ui.vertical(|ui| {
            ui.set_width(PROFILE_W);
            let (rect, _) =
                ui.allocate_exact_size(eg::vec2(PROFILE_W, PROFILE_W * 1.5), eg::Sense::hover());
            paint_image(ui.painter(), rect, tex.as_ref(), failed);
            ui.add(eg::Label::new(eg::RichText::new(&person.name).strong().size(12.0)).truncate());
            if let Some(ch) = person.character.as_deref().filter(|c| !c.is_empty()) {
                ui.add(eg::Label::new(eg::RichText::new(ch).weak().size(11.0)).truncate());
            }
        });
    }
}
