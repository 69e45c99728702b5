//! The interactive stdin menu.
//!
//! Generic over the output and the capture backend, and fed through a
//! [`LineInput`], so the whole dialogue can be driven from a script.
//!
//! Ctrl-C (an [`Interrupts`] tick) stops the running capture mode and
//! returns to the menu; at a prompt it ends the menu.

use std::io::Write;
use std::str::FromStr;

use log::{info, warn};

use crate::async_capture::AsyncCapture;
use crate::capture::CaptureBackend;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::input::LineInput;
use crate::interface::{self, InterfaceInfo};
use crate::interrupt::{Interrupted, Interrupts};
use crate::render::{Detail, InterfaceList, Metadata};
use crate::session::{Session, TerminationReason};
use crate::stats::AggregateStats;

/// Entries of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Print capture metadata of every packet
    Metadata,
    /// Print a full dump of every packet
    Detailed,
    /// Collect statistics until the deadline
    Statistics,
    Exit,
}

impl FromStr for MenuChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1" => Ok(MenuChoice::Metadata),
            "2" => Ok(MenuChoice::Detailed),
            "3" => Ok(MenuChoice::Statistics),
            "4" => Ok(MenuChoice::Exit),
            other => Err(Error::InvalidSelection {
                input: other.to_string(),
            }),
        }
    }
}

pub struct Menu<'a, B, W> {
    backend: &'a B,
    config: &'a Config,
    input: LineInput,
    output: W,
    interrupted: Interrupted,
}

impl<'a, B, W> Menu<'a, B, W>
where
    B: CaptureBackend,
    W: Write,
{
    /// A menu that is never interrupted; see [`Menu::with_interrupts`].
    pub fn new(backend: &'a B, config: &'a Config, input: LineInput, output: W) -> Self {
        Self {
            backend,
            config,
            input,
            output,
            interrupted: Interrupts::new().subscribe(),
        }
    }

    /// Listen to `interrupts` from now on.
    pub fn with_interrupts(mut self, interrupts: &Interrupts) -> Self {
        self.interrupted = interrupts.subscribe();
        self
    }

    /// Serve menu choices until "Exit", end of input, or an interrupt at a
    /// prompt.
    ///
    /// Failures inside a mode are printed and the menu is shown again; only
    /// errors writing to the output end the loop.
    pub async fn run(&mut self) -> Result<()> {
        self.print_menu()?;

        while let Some(line) = self.read_line().await? {
            let choice = match line.parse::<MenuChoice>() {
                Ok(choice) => choice,
                Err(_) => {
                    writeln!(self.output, "Invalid option. Please choose again:")?;
                    continue;
                }
            };

            let outcome = match choice {
                MenuChoice::Metadata => self.stream(StreamFormat::Metadata).await,
                MenuChoice::Detailed => self.stream(StreamFormat::Detailed).await,
                MenuChoice::Statistics => self.statistics().await,
                MenuChoice::Exit => {
                    writeln!(self.output, "Exiting...")?;
                    return Ok(());
                }
            };

            match outcome {
                Ok(()) => {}
                Err(Error::InputClosed) => break,
                Err(e) => {
                    warn!("{:?} mode failed: {}", choice, e);
                    writeln!(self.output, "Error: {}", e)?;
                }
            }
            self.print_menu()?;
        }

        info!("Input closed, leaving menu");
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn print_menu(&mut self) -> Result<()> {
        writeln!(self.output, "Choose an option:")?;
        writeln!(self.output, "1. Track packets with metadata")?;
        writeln!(self.output, "2. Track packets with detailed info")?;
        writeln!(self.output, "3. Track packets with statistics")?;
        writeln!(self.output, "4. Exit")?;
        Ok(())
    }

    /// Next trimmed input line; `None` at end of input or on interrupt.
    async fn read_line(&mut self) -> Result<Option<String>> {
        self.output.flush()?;
        tokio::select! {
            biased;
            _ = self.interrupted.recv() => {
                writeln!(self.output)?;
                info!("Interrupted at prompt");
                Ok(None)
            }
            line = self.input.next_line() => match line {
                Some(line) => Ok(Some(line?.trim().to_string())),
                None => Ok(None),
            },
        }
    }

    async fn choose_interface(&mut self) -> Result<InterfaceInfo> {
        let interfaces = self.backend.list_interfaces()?;
        write!(self.output, "{}", InterfaceList(&interfaces))?;
        writeln!(self.output, "Choose a network interface:")?;

        let line = self.read_line().await?.ok_or(Error::InputClosed)?;
        let index = interface::parse_selection(&line)?;
        interface::select_interface(&interfaces, index).cloned()
    }

    /// Print every packet until the source closes, an interrupt, or the
    /// packet limit, then print the totals.
    async fn stream(&mut self, format: StreamFormat) -> Result<()> {
        let iface = self.choose_interface().await?;
        let source = self.backend.open(&iface.name, &self.config.capture)?;
        let capture = AsyncCapture::new(source);
        info!("Streaming packets from {}", iface.name);

        let mut stats = AggregateStats::new();
        loop {
            if self
                .config
                .max_packets
                .is_some_and(|max| stats.total_packets >= max)
            {
                break;
            }

            let next = tokio::select! {
                biased;
                _ = self.interrupted.recv() => {
                    writeln!(self.output, "Interrupted.")?;
                    break;
                }
                next = capture.next_packet() => next,
            };

            match next {
                Some(Ok(record)) => {
                    match format {
                        StreamFormat::Metadata => write!(self.output, "{}", Metadata(&record))?,
                        StreamFormat::Detailed => write!(self.output, "{}", Detail(&record))?,
                    }
                    stats.update(&record);
                }
                Some(Err(e)) => {
                    write!(self.output, "{}", stats)?;
                    return Err(e);
                }
                None => break,
            }
        }

        capture.stop();
        write!(self.output, "{}", stats)?;
        Ok(())
    }

    /// Bounded statistics run on one interface.
    async fn statistics(&mut self) -> Result<()> {
        let iface = self.choose_interface().await?;
        let mut session = Session::new(iface.name, self.config.deadline);
        let source = self.backend.open(session.interface(), &self.config.capture)?;

        let report = tokio::select! {
            report = session.run(source) => report?,
            // Dropping the run future cancels its worker.
            _ = self.interrupted.recv() => {
                writeln!(self.output, "Interrupted.")?;
                return Ok(());
            }
        };
        match report.reason {
            TerminationReason::StreamExhausted => {
                writeln!(self.output, "Packet tracking completed.")?
            }
            TerminationReason::DeadlineExceeded => {
                writeln!(self.output, "Timeout: Packet tracking aborted.")?
            }
        }
        write!(self.output, "{}", report.stats)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum StreamFormat {
    Metadata,
    Detailed,
}
