// GUI-subsystem binary: Windows never allocates a console window for it.
// In CLI mode (--input/-i present) we attach to the launching terminal and
// reopen CONOUT$ so println!/eprintln! reach it despite SUBSYSTEM:WINDOWS.
#![windows_subsystem = "windows"]

mod app;
mod cli;

use std::path::PathBuf;

use app::RedactPadApp;
use eframe::egui;
use redactpad::logger;

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        #[cfg(target_os = "windows")]
        attach_parent_console();

        use clap::Parser;
        let args = cli::CliArgs::parse();
        std::process::exit(cli::run(args));
    }

    // -- GUI mode ----------------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 720.0])
            .with_title("RedactPad"),
        ..Default::default()
    };

    // An existing image path as the first argument skips the open dialog.
    let initial_image = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .filter(|p| p.is_file());

    eframe::run_native(
        "RedactPad",
        options,
        Box::new(|cc| Box::new(RedactPadApp::new(cc, initial_image))),
    )
}

/// Attach stdout/stderr to the parent terminal. Required in CLI mode because
/// the SUBSYSTEM:WINDOWS flag leaves the process without valid std handles.
#[cfg(target_os = "windows")]
fn attach_parent_console() {
    unsafe extern "system" {
        fn AttachConsole(dwProcessId: u32) -> i32;
        fn SetStdHandle(nStdHandle: u32, hHandle: isize) -> i32;
        fn CreateFileW(
            lpFileName: *const u16,
            dwDesiredAccess: u32,
            dwShareMode: u32,
            lpSecurityAttributes: *const std::ffi::c_void,
            dwCreationDisposition: u32,
            dwFlagsAndAttributes: u32,
            hTemplateFile: isize,
        ) -> isize;
    }
    const ATTACH_PARENT_PROCESS: u32 = 0xFFFF_FFFF;
    const GENERIC_WRITE: u32 = 0x4000_0000;
    const FILE_SHARE_READ_WRITE: u32 = 0x0000_0003;
    const OPEN_EXISTING: u32 = 3;
    const STD_OUTPUT_HANDLE: u32 = 0xFFFF_FFF5_u32; // -11
    const STD_ERROR_HANDLE: u32 = 0xFFFF_FFF4_u32; // -12
    const INVALID_HANDLE_VALUE: isize = -1;
    unsafe {
        AttachConsole(ATTACH_PARENT_PROCESS);
        // Reopen CONOUT$ so the process's output handles are valid.
        let conout: Vec<u16> = "CONOUT$\0".encode_utf16().collect();
        let hout = CreateFileW(
            conout.as_ptr(),
            GENERIC_WRITE,
            FILE_SHARE_READ_WRITE,
            std::ptr::null(),
            OPEN_EXISTING,
            0,
            0,
        );
        if hout != INVALID_HANDLE_VALUE {
            SetStdHandle(STD_OUTPUT_HANDLE, hout);
            SetStdHandle(STD_ERROR_HANDLE, hout);
        }
    }
}
