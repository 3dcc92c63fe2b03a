// src/app/ui/grid.rs
use eframe::egui as eg;

use crate::app::prefetch::MAX_UPLOADS_PER_FRAME;
use crate::app::session::Route;
use crate::app::types::Movie;
use crate::app::utils::{format_rating, release_year};

pub const CARD_W: f32 = 160.0;
pub const H_SPACING: f32 = 12.0;
pub const V_SPACING: f32 = 16.0;
const TEXT_H: f32 = 44.0;

pub(crate) enum CardAction {
    Open(String),
    ToggleFavorite(Movie),
}

/// Texture if there is one; otherwise a grey frame. `failed` switches the
/// frame label to the no-image placeholder.
pub(crate) fn paint_image(
    painter: &eg::Painter,
    rect: eg::Rect,
    tex: Option<&eg::TextureHandle>,
    failed: bool,
) {
    match tex {
        Some(tex) => {
            painter.image(
                tex.id(),
                rect,
                eg::Rect::from_min_max(eg::pos2(0.0, 0.0), eg::pos2(1.0, 1.0)),
                eg::Color32::WHITE,
            );
        }
        None => {
            painter.rect_filled(rect, 6.0, eg::Color32::from_gray(40));
            painter.text(
                rect.center(),
                eg::Align2::CENTER_CENTER,
                if failed { "No Image" } else { "…" },
                eg::FontId::proportional(13.0),
                eg::Color32::from_gray(170),
            );
        }
    }
}

fn draw_rating_badge(p: &eg::Painter, rect: eg::Rect, rating: f32) {
    let r = eg::Rect::from_min_size(
        eg::pos2(rect.left() + 6.0, rect.top() + 6.0),
        eg::vec2(44.0, 20.0),
    );
    p.rect_filled(r, eg::Rounding::same(6.0), eg::Color32::from_black_alpha(190));
    p.text(
        r.center(),
        eg::Align2::CENTER_CENTER,
        format!("★ {}", format_rating(rating)),
        eg::FontId::proportional(12.0),
        eg::Color32::from_rgb(250, 204, 21),
    );
}

impl crate::app::CinedexApp {
    /// Poster cards in rows; returns what the user clicked, if anything.
    pub(crate) fn ui_movie_grid(
        &mut self,
        ui: &mut eg::Ui,
        ctx: &eg::Context,
        movies: &[Movie],
        grid_id: &str,
    ) -> Option<CardAction> {
        let mut action = None;
        let mut uploads_left = MAX_UPLOADS_PER_FRAME;

        let avail = ui.available_width();
        let cols = ((avail + H_SPACING) / (CARD_W + H_SPACING))
            .floor()
            .max(1.0) as usize;

        eg::Grid::new(grid_id)
            .num_columns(cols)
            .spacing([H_SPACING, V_SPACING])
            .show(ui, |ui| {
                for (i, movie) in movies.iter().enumerate() {
                    if let Some(a) = self.ui_movie_card(ui, ctx, movie, &mut uploads_left) {
                        action = Some(a);
                    }
                    if (i + 1) % cols == 0 {
                        ui.end_row();
                    }
                }
            });
        action
    }

    fn ui_movie_card(
        &mut self,
        ui: &mut eg::Ui,
        ctx: &eg::Context,
        movie: &Movie,
        uploads_left: &mut usize,
    ) -> Option<CardAction> {
        let card_h = CARD_W * 1.5 + TEXT_H;
        let (rect, resp) = ui.allocate_exact_size(eg::vec2(CARD_W, card_h), eg::Sense::click());

        let poster_rect = eg::Rect::from_min_max(
            rect.min,
            eg::pos2(rect.min.x + CARD_W, rect.min.y + CARD_W * 1.5),
        );
        let text_rect = eg::Rect::from_min_max(eg::pos2(rect.min.x, poster_rect.max.y + 4.0), rect.max);

        let url = self.images.poster(movie.poster_path.as_deref());
        let tex = self.posters.texture(ctx, &url, uploads_left);
        paint_image(ui.painter(), poster_rect, tex.as_ref(), self.posters.is_failed(&url));
        draw_rating_badge(ui.painter(), poster_rect, movie.vote_average);

        // favorite heart, top-right
        let heart_rect = eg::Rect::from_center_size(
            eg::pos2(poster_rect.right() - 20.0, poster_rect.top() + 20.0),
            eg::vec2(28.0, 28.0),
        );
        let heart = ui
            .interact(heart_rect, eg::Id::new(("fav_heart", &movie.id)), eg::Sense::click())
            .on_hover_cursor(eg::CursorIcon::PointingHand);
        let is_fav = self.store.is_favorite(&movie.id);
        ui.painter()
            .circle_filled(heart_rect.center(), 14.0, eg::Color32::from_black_alpha(160));
        ui.painter().text(
            heart_rect.center(),
            eg::Align2::CENTER_CENTER,
            "❤",
            eg::FontId::proportional(16.0),
            if is_fav {
                eg::Color32::from_rgb(239, 68, 68)
            } else {
                eg::Color32::from_gray(200)
            },
        );

        if resp.hovered() {
            ui.painter().rect_stroke(
                poster_rect.shrink(1.0),
                6.0,
                eg::Stroke::new(2.0, ui.visuals().selection.bg_fill),
            );
        }

        // label: title, year
        let painter = ui.painter_at(text_rect);
        let text_color = ui.visuals().strong_text_color();
        let title = painter.layout(
            movie.title.clone(),
            eg::FontId::proportional(14.0),
            text_color,
            CARD_W,
        );
        let title_h = title.size().y.min(TEXT_H - 16.0);
        painter.galley(text_rect.min, title, text_color);
        if let Some(y) = release_year(movie.release_date.as_deref()) {
            painter.text(
                eg::pos2(text_rect.min.x, text_rect.min.y + title_h + 2.0),
                eg::Align2::LEFT_TOP,
                y.to_string(),
                eg::FontId::proportional(12.0),
                ui.visuals().weak_text_color(),
            );
        }

        if heart.clicked() {
            Some(CardAction::ToggleFavorite(movie.clone()))
        } else if resp.clicked() {
            Some(CardAction::Open(movie.id.clone()))
        } else {
            None
        }
    }

    pub(crate) fn handle_card_action(&mut self, action: Option<CardAction>) {
        match action {
            Some(CardAction::Open(id)) => self.navigate(Route::Movie(id)),
            Some(CardAction::ToggleFavorite(movie)) => self.toggle_favorite(&movie),
            None => {}
        }
    }
}
