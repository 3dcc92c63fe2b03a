// src/app/ui/auth.rs
use eframe::egui as eg;

use crate::app::session::Route;
use crate::app::users::{DEMO_EMAIL, DEMO_PASSWORD};

const FORM_W: f32 = 320.0;

fn error_line(ui: &mut eg::Ui, err: Option<&str>) {
    if let Some(err) = err {
        ui.label(eg::RichText::new(err).color(ui.visuals().error_fg_color));
        ui.add_space(6.0);
    }
}

fn field(ui: &mut eg::Ui, label: &str, value: &mut String, secret: bool) -> eg::Response {
    ui.label(label);
    let resp = ui.add(
        eg::TextEdit::singleline(value)
            .password(secret)
            .desired_width(FORM_W),
    );
    ui.add_space(6.0);
    resp
}

fn entered(resp: &eg::Response, ui: &eg::Ui) -> bool {
    resp.lost_focus() && ui.input(|i| i.key_pressed(eg::Key::Enter))
}

impl crate::app::CinedexApp {
    pub(crate) fn ui_render_login(&mut self, ui: &mut eg::Ui) {
        let mut submit = false;
        let mut go_register = false;

        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Sign in");
            ui.add_space(12.0);
        });
        ui.allocate_ui(eg::vec2(ui.available_width(), 0.0), |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(FORM_W);
                ui.with_layout(eg::Layout::top_down(eg::Align::Min), |ui| {
                    error_line(ui, self.forms.login_error.as_deref());
                    field(ui, "Email", &mut self.forms.login_email, false);
                    let pw = field(ui, "Password", &mut self.forms.login_password, true);
                    submit |= entered(&pw, ui);

                    if ui
                        .add_sized([FORM_W, 28.0], eg::Button::new("Sign in"))
                        .clicked()
                    {
                        submit = true;
                    }
                    ui.add_space(10.0);
                    ui.label(
                        eg::RichText::new(format!("Demo account: {DEMO_EMAIL} / {DEMO_PASSWORD}"))
                            .weak()
                            .size(12.0),
                    );
                    ui.horizontal(|ui| {
                        ui.label("Don't have an account?");
                        if ui.link("Register").clicked() {
                            go_register = true;
                        }
                    });
                });
            });
        });

        if submit {
            self.submit_login();
        } else if go_register {
            self.navigate(Route::Register);
        }
    }

    pub(crate) fn ui_render_register(&mut self, ui: &mut eg::Ui) {
        let mut submit = false;
        let mut go_login = false;

        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Create an account");
            ui.add_space(12.0);
        });
        ui.allocate_ui(eg::vec2(ui.available_width(), 0.0), |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(FORM_W);
                ui.with_layout(eg::Layout::top_down(eg::Align::Min), |ui| {
                    error_line(ui, self.forms.register_error.as_deref());
                    let form = &mut self.forms.register;
                    field(ui, "Name", &mut form.name, false);
                    field(ui, "Email", &mut form.email, false);
                    field(ui, "Password", &mut form.password, true);
                    let confirm = field(ui, "Confirm password", &mut form.confirm_password, true);
                    submit |= entered(&confirm, ui);

                    if ui
                        .add_sized([FORM_W, 28.0], eg::Button::new("Register"))
                        .clicked()
                    {
                        submit = true;
                    }
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        ui.label("Already have an account?");
                        if ui.link("Sign in").clicked() {
                            go_login = true;
                        }
                    });
                });
            });
        });

        if submit {
            self.submit_register();
        } else if go_login {
            self.navigate(Route::Login);
        }
    }
}
