//! # Dukan Register (terminal)
//!
//! A register that runs in a terminal. A keyboard-wedge scanner types
//! into the same stdin, so a scanned code arrives as one line.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load config (`dukan-register [path/to/register.toml]`)
//! 3. Build the HTTP API client and the register session
//! 4. Wire the scanner and camera into one barcode channel
//! 5. Loop over stdin lines and incoming barcodes
//!
//! ```text
//!   stdin line ─┬─ "/command" ──────────────► Register
//!               ├─ other text ─► HardwareScannerInput ─┐
//!               └─ (manual entry) ─► CameraChannel ────┤
//!                                                      ▼
//!                                BarcodeStream ──► Register::on_barcode_acquired
//! ```

mod commands;
mod terminal;

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use dukan_client::{
    barcode_channel, init_tracing, CameraChannel, ClientConfig, ClientResult, HardwareScannerInput,
    HttpPosApi, PosEventSink, PosError, PosResult, Register, ShortcutAction, UnavailableCamera,
};
use dukan_core::barcode::{Key, KeyTarget, Keystroke};
use dukan_core::Notice;

use commands::{Command, Input};
use terminal::TerminalSink;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Register stopped");
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

/// Everything the input loop needs.
struct Terminal {
    register: Register,
    scanner: HardwareScannerInput,
    camera: CameraChannel<UnavailableCamera>,
    sink: Arc<TerminalSink>,
}

enum Flow {
    Continue,
    Quit,
}

async fn run() -> ClientResult<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ClientConfig::load(config_path)?;
    info!(
        api = %config.api.base_url,
        store = %config.store.name,
        "Starting register"
    );

    let api = Arc::new(HttpPosApi::new(&config.api)?);
    let sink = Arc::new(TerminalSink::new(config.clone()));
    let register = Register::new(api, sink.clone(), &config.search);

    let (barcode_sink, mut barcodes) = barcode_channel();
    let mut terminal = Terminal {
        register,
        scanner: HardwareScannerInput::new(config.scanner_tuning(), barcode_sink.clone()),
        camera: CameraChannel::new(
            UnavailableCamera::new("no camera is attached to this terminal"),
            barcode_sink,
        ),
        sink,
    };

    println!("{} register, session {}", config.store.name, terminal.register.session_id());
    println!("{}", commands::HELP);

    let mut lines = spawn_stdin_reader();
    loop {
        tokio::select! {
            Some(barcode) = barcodes.next() => {
                settle(terminal.register.on_barcode_acquired(barcode).await);
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("stdin closed");
                    break;
                };
                if let Flow::Quit = terminal.handle_line(&line).await {
                    break;
                }
            }
        }
    }

    info!(session_id = %terminal.register.session_id(), "Register closed");
    Ok(())
}

impl Terminal {
    async fn handle_line(&mut self, line: &str) -> Flow {
        if self.camera.is_manual_entry() {
            return self.manual_entry(line).await;
        }

        match commands::parse_line(line) {
            Ok(Input::Empty) => Flow::Continue,
            Ok(Input::Keystrokes(text)) => {
                self.type_keys(&text);
                Flow::Continue
            }
            Ok(Input::Command(command)) => self.dispatch(command).await,
            Err(err) => {
                println!("{}", err);
                Flow::Continue
            }
        }
    }

    /// The whole line arrives at once, so every key shares one instant.
    fn type_keys(&mut self, text: &str) {
        let now = Instant::now();
        for c in text.chars() {
            self.scanner
                .on_keystroke(Keystroke::new(Key::Char(c), KeyTarget::Other, now));
        }
        if !self
            .scanner
            .on_keystroke(Keystroke::new(Key::Enter, KeyTarget::Other, now))
        {
            println!("Too short for a barcode. Type /help for commands.");
        }
    }

    async fn manual_entry(&mut self, line: &str) -> Flow {
        if line.trim().eq_ignore_ascii_case("/cancel") {
            self.camera.close().await;
            println!("Scanner closed");
            return Flow::Continue;
        }

        if let Err(err) = self.camera.submit_manual(line).await {
            self.sink.notice(&PosError::from(err).notice());
            println!("Enter the barcode (or /cancel):");
        }
        Flow::Continue
    }

    async fn open_scanner(&mut self) {
        match self.camera.open().await {
            Ok(()) => println!("Scanner open"),
            Err(err) => {
                self.sink.notice(&PosError::from(err).notice());
                println!("Enter the barcode (or /cancel):");
            }
        }
    }

    async fn dispatch(&mut self, command: Command) -> Flow {
        let register = &mut self.register;

        match command {
            Command::Search(query) => settle(register.search_now(&query).await),
            Command::Find(query) => register.search_input_changed(&query),
            Command::Add(n) => match self.sink.result(n) {
                Some(product) => settle(register.add_product(&product)),
                None => println!("No result #{}. Run /search first.", n),
            },
            Command::Quantity {
                product_id,
                quantity,
            } => settle(register.set_quantity(product_id, quantity)),
            Command::Remove(product_id) => {
                if register.remove_product(product_id).is_none() {
                    println!("Product {} is not in the cart", product_id);
                }
            }
            Command::Discount(amount) => settle(register.set_discount(&amount)),
            Command::Name(name) => register.set_customer_name(&name),
            Command::Phone(phone) => register.set_customer_phone(&phone),
            Command::Pay(method) => register.set_payment_method(method),
            Command::Checkout => settle(register.checkout().await),
            Command::Clear => register.clear_cart(),
            Command::Scan => self.open_scanner().await,
            Command::CancelScan => self.camera.close().await,
            Command::Cart => self.sink.print_cart(&register.view()),
            Command::Shortcut {
                shortcut,
                confirmed,
            } => match register.handle_shortcut(shortcut, confirmed).await {
                Ok(Some(ShortcutAction::FocusSearch)) => println!("Search: /search <text>"),
                Ok(Some(ShortcutAction::OpenScanner)) => self.open_scanner().await,
                Ok(Some(_)) => {}
                Ok(None) => self.sink.notice(&Notice::info(format!(
                    "{} is not available right now",
                    shortcut.key()
                ))),
                Err(err) => debug!(code = ?err.code(), "Shortcut failed"),
            },
            Command::Help => println!("{}", commands::HELP),
            Command::Quit => return Flow::Quit,
        }

        Flow::Continue
    }
}

/// Register errors are already shown as notices; only log them here.
fn settle<T>(result: PosResult<T>) {
    if let Err(err) = result {
        debug!(code = ?err.code(), error = %err, "Register action did not complete");
    }
}

/// Reads stdin on a plain thread and forwards each line.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Failed to read stdin");
                    break;
                }
            }
        }
    });

    rx
}
