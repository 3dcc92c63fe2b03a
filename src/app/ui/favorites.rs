// src/app/ui/favorites.rs
use eframe::egui as eg;

use crate::app::session::Route;

impl crate::app::CinedexApp {
    pub(crate) fn ui_render_favorites(&mut self, ui: &mut eg::Ui, ctx: &eg::Context) {
        ui.heading("My Favorite Movies");
        ui.add_space(8.0);

        if self.store.favorites().is_empty() {
            let mut explore = false;
            ui.vertical_centered(|ui| {
                ui.add_space(60.0);
                ui.label(eg::RichText::new("You haven't added any favorites yet").size(18.0));
                ui.add_space(12.0);
                if ui.button("Explore Movies").clicked() {
                    explore = true;
                }
            });
            if explore {
                self.navigate(Route::Home);
            }
            return;
        }

        let movies = self.store.favorites().to_vec();
        let action = eg::ScrollArea::vertical()
            .id_source("favorites_scroll")
            .auto_shrink([false; 2])
            .show(ui, |ui| self.ui_movie_grid(ui, ctx, &movies, "favorites_grid"))
            .inner;
        self.handle_card_action(action);
    }
}
