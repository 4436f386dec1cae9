use ksni::menu::StandardItem;
use ksni::{MenuItem, Tray};
use slint::ComponentHandle;

use crate::AppWindow;

pub struct AppTray {
    pub ui: slint::Weak<AppWindow>,
}

impl Tray for AppTray {
    fn id(&self) -> String {
        "color-sampler".into()
    }

    fn title(&self) -> String {
        "Color Sampler".into()
    }

    fn icon_name(&self) -> String {
        "color-select".into()
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        let _ = self.ui.upgrade_in_event_loop(|ui| {
            ui.window().show().ok();
        });
    }

    fn menu(&self) -> Vec<MenuItem<Self>> {
        vec![
            StandardItem {
                label: "Open".into(),
                activate: Box::new(|this: &mut AppTray| {
                    let _ = this.ui.upgrade_in_event_loop(|ui: AppWindow| {
                        ui.window().show().ok();
                    });
                }),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Pick color".into(),
                activate: Box::new(|this: &mut AppTray| {
                    let _ = this.ui.upgrade_in_event_loop(|ui: AppWindow| {
                        ui.invoke_pick_color();
                    });
                }),
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Quit".into(),
                activate: Box::new(|_this: &mut AppTray| {
                    let _ = request_quit();
                }),
                ..Default::default()
            }
            .into(),
        ]
    }
}

fn request_quit() -> Result<(), slint::EventLoopError> {
    slint::invoke_from_event_loop(|| {
        slint::quit_event_loop().ok();
    })
}
