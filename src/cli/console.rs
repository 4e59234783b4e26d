//! Line input for the interactive menus.
//!
//! Reading returns `None` both at end of input and after Ctrl-C. Menus treat
//! `None` as "go back"; the main menu quits only at end of input. Long
//! backend and speech calls run through [`Console::interruptible`] so Ctrl-C
//! abandons them.

use console::style;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

pub struct Console {
    /// Scripted input; `None` reads the process stdin.
    reader: Option<Box<dyn BufRead + Send>>,
    interrupted: Arc<AtomicBool>,
    /// Wakes tasks waiting in [`Console::interruptible`].
    cancel: Arc<Notify>,
    closed: bool,
}

impl Console {
    /// Read from the terminal.
    pub fn stdin() -> Self {
        Self {
            reader: None,
            interrupted: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(Notify::new()),
            closed: false,
        }
    }

    /// Read from a fixed script of lines.
    pub fn scripted(input: &str) -> Self {
        Self {
            reader: Some(Box::new(io::Cursor::new(input.to_string().into_bytes()))),
            interrupted: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(Notify::new()),
            closed: false,
        }
    }

    /// Catch Ctrl-C for the rest of the process so it interrupts the current
    /// menu instead of killing the program.
    pub fn watch_interrupts(&self) {
        let flag = Arc::clone(&self.interrupted);
        let cancel = Arc::clone(&self.cancel);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                debug!("Interrupt received");
                signal_interrupt(&flag, &cancel);
                println!();
            }
        });
    }

    /// Mark the console as interrupted, as Ctrl-C does.
    pub fn interrupt(&self) {
        signal_interrupt(&self.interrupted, &self.cancel);
    }

    /// Run `task` until it completes or Ctrl-C arrives.
    ///
    /// Returns `None` when interrupted. The task is dropped and the interrupt
    /// is consumed, so the next read waits for input as usual.
    pub async fn interruptible<F: Future>(&self, task: F) -> Option<F::Output> {
        let cancelled = self.cancel.notified();
        tokio::select! {
            output = task => Some(output),
            _ = cancelled => {
                self.interrupted.store(false, Ordering::SeqCst);
                None
            }
        }
    }

    /// True once input has ended.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Read one trimmed line.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        if self.take_interrupt() {
            return Ok(None);
        }

        let mut line = String::new();
        let read = match self.reader.as_mut() {
            Some(reader) => reader.read_line(&mut line)?,
            None => io::stdin().lock().read_line(&mut line)?,
        };
        if read == 0 {
            self.closed = true;
            return Ok(None);
        }
        if self.take_interrupt() {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Print `label` and read the answer.
    pub fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        print!("{} ", style(label).green().bold());
        io::stdout().flush()?;
        self.read_line()
    }

    /// Wait for ENTER.
    pub fn pause(&mut self) -> io::Result<()> {
        print!("{}", style("Press ENTER to continue...").dim());
        io::stdout().flush()?;
        self.read_line()?;
        println!();
        Ok(())
    }

    fn take_interrupt(&self) -> bool {
        self.interrupted.swap(false, Ordering::SeqCst)
    }
}

fn signal_interrupt(flag: &AtomicBool, cancel: &Notify) {
    flag.store(true, Ordering::SeqCst);
    cancel.notify_waiters();
}
