//! HID keyboard subsystem - report type, scan-code mapping and the
//! pending-report assembler that batches keystrokes into reports.

pub mod assembler;
pub mod keyboard;
pub mod keymap;

pub use assembler::{ReportAssembler, ReportSink};
pub use keyboard::KeyboardReport;
