// src/app/ui/browse.rs
use eframe::egui as eg;

use crate::app::browse::{near_bottom, LoadState};

impl crate::app::CinedexApp {
    pub(crate) fn ui_render_browse(&mut self, ui: &mut eg::Ui, ctx: &eg::Context) {
        self.ensure_browse();

        ui.horizontal(|ui| {
            let resp = ui.add(
                eg::TextEdit::singleline(&mut self.search_text)
                    .hint_text("Search movies…")
                    .desired_width(320.0),
            );
            if resp.changed() {
                self.on_search_input();
            }
            if self.debouncer.is_pending() {
                ui.add(eg::Spinner::new().size(14.0));
            }
        });
        ui.add_space(8.0);
        ui.heading(self.browse.heading());
        ui.add_space(6.0);

        let movies = self.browse.movies().to_vec();
        let mut more_clicked = false;
        let mut retry_clicked = false;

        let out = eg::ScrollArea::vertical()
            .id_source("browse_scroll")
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                let action = self.ui_movie_grid(ui, ctx, &movies, "browse_grid");
                ui.add_space(12.0);

                ui.vertical_centered(|ui| match self.browse.load_state() {
                    LoadState::Loading => {
                        ui.add(eg::Spinner::new().size(24.0));
                    }
                    LoadState::Failed(err) => {
                        if movies.is_empty() {
                            ui.label("No movies found");
                        }
                        ui.label(eg::RichText::new(err).weak());
                        if ui.button("Retry").clicked() {
                            retry_clicked = true;
                        }
                    }
                    LoadState::Idle => {
                        if self.browse.is_empty_result() {
                            ui.label("No movies found");
                        } else if self.browse.has_more() && ui.button("Load More").clicked() {
                            more_clicked = true;
                        }
                    }
                });
                ui.add_space(16.0);
                action
            });

        let at_end = near_bottom(
            out.state.offset.y,
            out.inner_rect.height(),
            out.content_size.y,
        );
        if more_clicked || (at_end && !movies.is_empty()) {
            self.load_more();
        }
        if retry_clicked {
            self.retry_listing();
        }
        self.handle_card_action(out.inner);
    }
}
