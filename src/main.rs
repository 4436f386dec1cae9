slint::include_modules!();

mod clipboard;
mod color;
mod config;
mod controller;
mod hotkeys;
mod input;
mod listeners;
mod overlay;
mod presenter;
mod sampler;
mod tray;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager};
use ksni::blocking::TrayMethods;
use slint::{Color, Timer, TimerMode};

use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::color::SampledColor;
use crate::config::AppConfig;
use crate::controller::{Activation, Controller};
use crate::hotkeys::HotkeyListeners;
use crate::input::InputPoller;
use crate::overlay::SlintOverlay;
use crate::sampler::{spawn_sample, Cancelled, SampleOutcome, ScreenEyeDropper};
use crate::tray::AppTray;

type Sampler = Controller<SlintOverlay, SystemClipboard, HotkeyListeners>;

const TICK: Duration = Duration::from_millis(16);
const READY_STATUS: &str = "Pick a color, then click anywhere on screen. Esc cancels.";

fn show_color(ui: &AppWindow, color: SampledColor) {
    let (r, g, b) = color.rgb();
    ui.set_current_color(Color::from_rgb_u8(r, g, b));
    ui.set_val_hex(color.hex_digits().into());
    ui.set_val_rgb(color.rgb_string().into());
    ui.set_val_hsl(color.hsl_string().into());
    ui.set_val_hsv(color.hsv_string().into());
}

fn apply_config(ui: &AppWindow, cfg: &AppConfig) {
    ui.global::<Skin>().set_dark_mode(cfg.dark_mode);
    ui.set_setting_minimize(cfg.setting_minimize);
    ui.set_setting_autocopy(cfg.setting_autocopy);
}

fn snapshot_config(ui: &AppWindow, base: &AppConfig) -> AppConfig {
    AppConfig {
        dark_mode: ui.global::<Skin>().get_dark_mode(),
        setting_minimize: ui.get_setting_minimize(),
        setting_autocopy: ui.get_setting_autocopy(),
        ..base.clone()
    }
}

fn start_pick(
    ui: &AppWindow,
    controller: &Rc<RefCell<Sampler>>,
    dropper: Option<ScreenEyeDropper>,
    results: &mpsc::Sender<SampleOutcome>,
) {
    let activation = controller.borrow_mut().activate();
    let cancel = match activation {
        Activation::Start(cancel) => cancel,
        Activation::Busy => {
            log::debug!("pick already in progress");
            return;
        }
        Activation::Unavailable => return,
    };
    let Some(dropper) = dropper else {
        controller.borrow_mut().complete(Err(Cancelled));
        return;
    };

    if ui.get_setting_minimize() {
        ui.window().hide().ok();
    }
    if let Err(err) = spawn_sample(dropper, cancel, results.clone()) {
        log::error!("could not start eyedropper: {}", err);
        controller.borrow_mut().complete(Err(Cancelled));
    }
}

fn main() -> Result<(), slint::PlatformError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = AppConfig::load();
    let ui = AppWindow::new()?;
    let overlay = SamplerOverlay::new()?;
    overlay.hide().ok();
    apply_config(&ui, &cfg);
    let ui_handle = ui.as_weak();

    let tray = AppTray { ui: ui_handle.clone() };
    let _tray_handle = match tray.spawn() {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("tray: failed to spawn: {:?}", e);
            None
        }
    };

    let manager = match GlobalHotKeyManager::new() {
        Ok(manager) => Some(manager),
        Err(e) => {
            log::warn!("global shortcuts unavailable: {}", e);
            None
        }
    };
    let activation_hotkey = hotkeys::activation_hotkey();
    if let Some(manager) = &manager {
        if let Err(e) = manager.register(activation_hotkey) {
            log::warn!("could not register pick shortcut: {}", e);
        }
    }
    let listeners = HotkeyListeners::new(manager);
    let copy_id = listeners.copy_id();

    let dropper = match ScreenEyeDropper::probe() {
        Ok(dropper) => Some(dropper),
        Err(e) => {
            log::warn!("{}", e);
            None
        }
    };

    let mut ctl = Controller::new(
        SlintOverlay::new(overlay.as_weak()),
        SystemClipboard,
        listeners,
        dropper.map(|d| d.screen_size()),
    );
    ctl.set_pointer_offset(cfg.pointer_offset);
    ctl.set_autocopy(cfg.setting_autocopy);
    if dropper.is_some() {
        ui.set_status(READY_STATUS.into());
    } else {
        ctl.report_unsupported();
        ui.set_sampling_available(false);
        ui.set_status(presenter::UNSUPPORTED_LABEL.into());
    }

    let controller = Rc::new(RefCell::new(ctl));
    let config = Rc::new(RefCell::new(cfg));
    let (results_tx, results_rx) = mpsc::channel::<SampleOutcome>();

    let pick_ui = ui_handle.clone();
    let pick_controller = controller.clone();
    let pick_results = results_tx.clone();
    ui.on_pick_color(move || {
        if let Some(ui) = pick_ui.upgrade() {
            start_pick(&ui, &pick_controller, dropper, &pick_results);
        }
    });

    // pointer, Escape, clicks, hotkeys and finished picks all arrive here
    let tick = Timer::default();
    let tick_ui = ui_handle.clone();
    let tick_controller = controller.clone();
    let mut poller = InputPoller::new();
    let activation_id = activation_hotkey.id();
    tick.start(TimerMode::Repeated, TICK, move || {
        let events = poller.poll();
        {
            let mut ctl = tick_controller.borrow_mut();
            if let Some((x, y)) = events.pointer {
                ctl.pointer_moved(x, y);
            }
            if events.escape {
                ctl.escape_pressed();
            }
            if events.click {
                ctl.click();
            }
        }

        let mut pick_requested = false;
        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if event.id == copy_id {
                tick_controller.borrow_mut().copy_shortcut();
            } else if event.id == activation_id {
                pick_requested = true;
            }
        }

        while let Ok(outcome) = results_rx.try_recv() {
            let picked = {
                let mut ctl = tick_controller.borrow_mut();
                if !ctl.complete(outcome) {
                    continue;
                }
                ctl.overlay().background
            };
            // the press that picked the color must not dismiss it on release
            poller.disarm_click();
            if let Some(ui) = tick_ui.upgrade() {
                if let Some(color) = picked {
                    show_color(&ui, color);
                }
                if ui.get_setting_minimize() {
                    ui.window().show().ok();
                }
            }
        }

        if pick_requested {
            if let Some(ui) = tick_ui.upgrade() {
                start_pick(&ui, &tick_controller, dropper, &results_tx);
            }
        }
    });

    let hold = Duration::from_millis(config.borrow().long_press_ms);
    let press_controller = controller.clone();
    overlay.on_press_started(move || {
        let token = press_controller.borrow_mut().press_started();
        if let Some(token) = token {
            let controller = press_controller.clone();
            Timer::single_shot(hold, move || {
                controller.borrow_mut().long_press_elapsed(token);
            });
        }
    });
    let release_controller = controller.clone();
    overlay.on_press_released(move || {
        release_controller.borrow_mut().press_released();
    });

    ui.on_copy_to_clipboard(move |text| {
        if let Err(e) = SystemClipboard.write_text(text.as_str()) {
            log::error!("{}", e);
        }
    });

    let hex_ui = ui_handle.clone();
    ui.on_hex_accepted(move |text| {
        let Some(ui) = hex_ui.upgrade() else {
            return;
        };
        match text.parse::<SampledColor>() {
            Ok(color) => show_color(&ui, color),
            Err(e) => log::debug!("ignoring hex input {:?}: {}", text.as_str(), e),
        }
    });

    let settings_ui = ui_handle.clone();
    let settings_controller = controller.clone();
    let settings_config = config.clone();
    ui.on_settings_changed(move || {
        if let Some(ui) = settings_ui.upgrade() {
            let cfg = snapshot_config(&ui, &settings_config.borrow());
            settings_controller.borrow_mut().set_autocopy(cfg.setting_autocopy);
            cfg.save();
            *settings_config.borrow_mut() = cfg;
        }
    });

    let ui_close = ui_handle.clone();
    ui.window().on_close_requested(move || {
        let _ = ui_close.upgrade_in_event_loop(|ui| {
            ui.set_close_confirm_open(true);
        });
        slint::CloseRequestResponse::KeepWindowShown
    });

    let ui_close = ui_handle.clone();
    ui.on_close_confirm_close(move || {
        if let Some(ui) = ui_close.upgrade() {
            ui.set_close_confirm_open(false);
        }
        slint::quit_event_loop().ok();
    });

    let ui_min = ui_handle.clone();
    ui.on_close_confirm_minimize(move || {
        let _ = ui_min.upgrade_in_event_loop(|ui| {
            ui.set_close_confirm_open(false);
            ui.window().hide().ok();
        });
    });

    ui.show()?;
    let result = slint::run_event_loop_until_quit();

    tick.stop();
    controller.borrow_mut().shutdown();
    snapshot_config(&ui, &config.borrow()).save();
    result
}
