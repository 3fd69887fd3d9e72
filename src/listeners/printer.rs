// src/listeners/printer.rs

//! Terminal progress printers.
//!
//! Both printers are pure rendering: they keep no state beyond the
//! indentation derived from the last step header, and they tolerate
//! arbitrarily interleaved events (a node result with no preceding step
//! header simply renders at the default indent). Write errors are
//! ignored; losing a progress line must never take down the consuming
//! task.

use std::io::Write;

use crate::monitor::MonitorEvent;

use super::MonitorListener;

const DEFAULT_INDENT: usize = 8;

fn outcome(success: bool) -> &'static str {
    if success { "ok" } else { "fail" }
}

/// Full step-list outputter: one header line per step, per-node results
/// indented beneath it, a summary line on completion.
pub struct StepListPrinter {
    out: Box<dyn Write + Send>,
    indent: usize,
}

impl StepListPrinter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            indent: DEFAULT_INDENT,
        }
    }

    fn counter(index: usize, total: usize) -> String {
        let width = total.to_string().len();
        format!("[{:>width$}/{total}]", index + 1)
    }
}

impl Default for StepListPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorListener for StepListPrinter {
    fn handle_event(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::StepStarted { step, index, total, targets } => {
                let counter = Self::counter(*index, *total);
                self.indent = counter.len() + 1;
                let _ = if targets.is_empty() {
                    writeln!(self.out, "{counter} {}...", step.label)
                } else {
                    writeln!(
                        self.out,
                        "{counter} {} on {}...",
                        step.label,
                        targets.join(", ")
                    )
                };
            }
            MonitorEvent::StepCompleted { step, index, total, success } => {
                let counter = Self::counter(*index, *total);
                let _ = writeln!(self.out, "{counter} {}: {}", step.label, outcome(*success));
            }
            MonitorEvent::NodeResult { node, success, .. } => {
                let _ = writeln!(
                    self.out,
                    "{:indent$}{node}: {}",
                    "",
                    outcome(*success),
                    indent = self.indent
                );
            }
            MonitorEvent::RebootNeeded { node, reason } => {
                let _ = if reason.is_empty() {
                    writeln!(self.out, "{:indent$}reboot required: {node}", "", indent = self.indent)
                } else {
                    writeln!(
                        self.out,
                        "{:indent$}reboot required: {node} ({reason})",
                        "",
                        indent = self.indent
                    )
                };
            }
        }
        let _ = self.out.flush();
    }
}

/// Minimal outputter: one line per event, no alignment.
pub struct SimplePrinter {
    out: Box<dyn Write + Send>,
}

impl SimplePrinter {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }
}

impl Default for SimplePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorListener for SimplePrinter {
    fn handle_event(&mut self, event: &MonitorEvent) {
        let _ = match event {
            MonitorEvent::StepStarted { step, targets, .. } => {
                if targets.is_empty() {
                    writeln!(self.out, "started: {}", step.id)
                } else {
                    writeln!(self.out, "started: {} on {}", step.id, targets.join(", "))
                }
            }
            MonitorEvent::StepCompleted { step, success, .. } => {
                writeln!(self.out, "{}: {}", outcome(*success), step.id)
            }
            MonitorEvent::NodeResult { node, success, .. } => {
                writeln!(self.out, "  {node}: {}", outcome(*success))
            }
            MonitorEvent::RebootNeeded { node, reason } => {
                writeln!(self.out, "reboot required: {node} {reason}")
            }
        };
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlannedStep;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn started(id: &str, index: usize, total: usize, targets: &[&str]) -> MonitorEvent {
        MonitorEvent::StepStarted {
            step: PlannedStep::new(id, id),
            index,
            total,
            targets: targets.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn completed(id: &str, index: usize, total: usize, success: bool) -> MonitorEvent {
        MonitorEvent::StepCompleted {
            step: PlannedStep::new(id, id),
            index,
            total,
            success,
        }
    }

    #[test]
    fn step_list_renders_counter_and_results() {
        let buf = SharedBuf::default();
        let mut printer = StepListPrinter::with_writer(Box::new(buf.clone()));

        printer.handle_event(&started("cluster.mon", 2, 12, &["mon1", "mon2"]));
        printer.handle_event(&MonitorEvent::NodeResult {
            step_id: "cluster.mon".into(),
            node: "mon1".into(),
            success: true,
            ret: None,
        });
        printer.handle_event(&completed("cluster.mon", 2, 12, false));

        let out = buf.contents();
        assert!(out.contains("[ 3/12] cluster.mon on mon1, mon2..."));
        assert!(out.contains("mon1: ok"));
        assert!(out.contains("[ 3/12] cluster.mon: fail"));
    }

    #[test]
    fn node_result_without_step_header_uses_default_indent() {
        let buf = SharedBuf::default();
        let mut printer = StepListPrinter::with_writer(Box::new(buf.clone()));

        // Out-of-order node result, no preceding header; must not panic.
        printer.handle_event(&MonitorEvent::NodeResult {
            step_id: "stray".into(),
            node: "n1".into(),
            success: false,
            ret: None,
        });

        assert!(buf.contents().contains("n1: fail"));
    }

    #[test]
    fn simple_printer_is_one_line_per_event() {
        let buf = SharedBuf::default();
        let mut printer = SimplePrinter::with_writer(Box::new(buf.clone()));

        printer.handle_event(&started("discover", 0, 2, &[]));
        printer.handle_event(&completed("discover", 0, 2, true));
        printer.handle_event(&MonitorEvent::RebootNeeded {
            node: "osd1".into(),
            reason: "kernel update".into(),
        });

        let out = buf.contents();
        assert_eq!(out.lines().count(), 3);
        assert!(out.contains("started: discover"));
        assert!(out.contains("ok: discover"));
        assert!(out.contains("reboot required: osd1 kernel update"));
    }
}
