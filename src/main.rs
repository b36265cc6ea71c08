//! Grammary: select text anywhere, press the capture hotkey, and translate,
//! correct, summarize or re-tone it from a popup at the pointer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use gpui::{App, AppContext as _, Application, Timer};
use tracing::{info, warn};

use grammary::config::{self, Config};
use grammary::hotkeys;
use grammary::keys::{self, KeyMap, KeyStore, KeyringStore};
use grammary::logging;
use grammary::platform;
use grammary::popup::{PopupController, PopupDeps, PopupEvent};
use grammary::protocol::{self, Backend, Message, Response};
use grammary::selected_text::{self, SystemCapture};
use grammary::transform::{TextTransform, TransformService};
use grammary::tray::{TrayManager, TrayMenuAction};
use grammary::workspace::{open_workspace, WorkspaceDeps};

#[derive(Parser, Debug)]
#[command(name = "grammary")]
#[command(about = "Selection-anchored translation and writing assistant")]
#[command(version)]
struct Args {
    /// Config file to use instead of ~/.grammary/config.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run without a tray icon
    #[arg(long)]
    no_tray: bool,

    /// Debug-level logging on stderr
    #[arg(long, short)]
    verbose: bool,

    /// Store an API key (NAME=VALUE, e.g. openrouter=sk-...) and exit
    #[arg(long = "set-key", value_name = "NAME=VALUE", value_parser = keys::parse_assignment)]
    set_key: Vec<(String, String)>,

    /// List stored API keys (masked) and exit
    #[arg(long)]
    show_keys: bool,

    /// Answer transform:* and keys:* JSON lines on stdin, then exit
    #[arg(long)]
    stdio: bool,
}

/// Handles `--set-key` / `--show-keys` through the same backend the popups
/// use. Returns the process exit code.
fn run_key_commands(args: &Args, backend: &Backend) -> i32 {
    let mut code = 0;

    if !args.set_key.is_empty() {
        let keys: KeyMap = args.set_key.iter().cloned().collect();
        match backend.handle(&Message::SaveKeys { keys }) {
            Some(Response::Ack { ok: true }) => {
                for (name, _) in &args.set_key {
                    println!("Saved {}", name);
                }
            }
            Some(Response::Error { message }) => {
                eprintln!("Could not save keys: {}", message);
                code = 1;
            }
            _ => {
                eprintln!("Could not save keys; see {}", logging::log_path().display());
                code = 1;
            }
        }
    }

    if args.show_keys {
        match backend.handle(&Message::GetKeys) {
            Some(Response::Keys { keys }) if keys.is_empty() => println!("No keys stored"),
            Some(Response::Keys { keys }) => {
                for (name, value) in &keys {
                    println!("{:<12} {}", name, keys::mask(value));
                }
            }
            _ => code = 1,
        }
    }

    code
}

fn start_event_loops(
    cx: &mut App,
    controller: gpui::Entity<PopupController>,
    events: async_channel::Receiver<PopupEvent>,
) {
    let hotkey_controller = controller.clone();
    cx.spawn(async move |cx: &mut gpui::AsyncApp| {
        while let Ok(()) = hotkeys::capture_channel().1.recv().await {
            let _ = cx.update(|cx| {
                hotkey_controller.update(cx, |controller, cx| controller.on_hotkey(cx))
            });
        }
    })
    .detach();

    cx.spawn(async move |cx: &mut gpui::AsyncApp| {
        while let Ok(event) = events.recv().await {
            let _ = cx.update(|cx| controller.update(cx, |controller, cx| controller.on_event(event, cx)));
        }
    })
    .detach();
}

fn show_workspace(deps: &WorkspaceDeps, cx: &mut App) {
    if let Err(e) = open_workspace(deps, cx) {
        warn!(error = %format!("{:#}", e), "Failed to open main window");
    }
}

/// Polls tray menu clicks. The tray must stay alive for the icon to show,
/// so it is moved into the task.
fn start_tray(cx: &mut App, tray: TrayManager, workspace: WorkspaceDeps) {
    cx.spawn(async move |cx: &mut gpui::AsyncApp| loop {
        Timer::after(Duration::from_millis(100)).await;
        while let Ok(event) = tray.menu_event_receiver().try_recv() {
            match tray.match_menu_event(&event) {
                Some(TrayMenuAction::Open) => {
                    logging::log("TRAY", "Open Grammary");
                    let _ = cx.update(|cx| show_workspace(&workspace, cx));
                }
                Some(TrayMenuAction::Quit) => {
                    logging::log("TRAY", "Quit");
                    let _ = cx.update(|cx| cx.quit());
                    return;
                }
                None => {}
            }
        }
    })
    .detach();
}

fn main() {
    let args = Args::parse();
    let log_guard = logging::init(args.verbose);

    let config: Config = config::load_config(args.config.as_deref());
    let keys: Arc<dyn KeyStore> = Arc::new(KeyringStore::new());
    let transform: Arc<dyn TextTransform> =
        Arc::new(TransformService::from_config(&config.transform, keys.clone()));
    let backend = Arc::new(Backend::new(
        transform.clone(),
        keys,
        config.transform.default_tone,
    ));

    if args.stdio {
        let stdin = std::io::stdin();
        let code = match protocol::serve(&backend, stdin.lock(), std::io::stdout().lock()) {
            Ok(_) => 0,
            Err(e) => {
                eprintln!("{:#}", e);
                1
            }
        };
        drop(log_guard);
        std::process::exit(code);
    }

    if !args.set_key.is_empty() || args.show_keys {
        let code = run_key_commands(&args, &backend);
        drop(log_guard);
        std::process::exit(code);
    }

    info!(
        hotkey = %hotkeys::hotkey_display(&config.hotkey),
        model = %config.transform.model,
        tray = config.tray && !args.no_tray,
        "Starting Grammary"
    );

    if !selected_text::has_accessibility_permission() {
        warn!("Accessibility permission missing; selection capture will fail until granted");
        selected_text::request_accessibility_permission();
    }

    hotkeys::start_hotkey_listener(config.hotkey.clone());
    let _log_guard = log_guard;

    let show_tray = config.tray && !args.no_tray;
    Application::new().run(move |cx: &mut App| {
        platform::configure_as_accessory_app();

        let (events_tx, events_rx) = async_channel::unbounded();
        let deps = PopupDeps {
            config: config.popup.clone(),
            transform: transform.clone(),
            default_tone: config.transform.default_tone,
            events: events_tx,
        };
        let controller = cx.new(|_| PopupController::new(deps, Arc::new(SystemCapture)));
        start_event_loops(cx, controller, events_rx);

        let workspace = WorkspaceDeps {
            config: config.clone(),
            transform,
            backend,
        };
        show_workspace(&workspace, cx);

        if show_tray {
            if let Some(tray) = TrayManager::try_create() {
                start_tray(cx, tray, workspace);
            }
        }

        logging::log(
            "APP",
            &format!(
                "Ready - press {} with text selected",
                hotkeys::hotkey_display(&config.hotkey)
            ),
        );
    });
}
