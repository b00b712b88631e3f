use std::io::{self, Write};

use ansi_term::{Color, Style};

use crate::record::{types, Record};

pub struct Listing<W: Write> {
    out: W,
    printer: ColorPrinter,
    abs_high: u32,
}

impl<W: Write> Listing<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            printer: ColorPrinter::default(),
            abs_high: 0,
        }
    }

    pub fn push(&mut self, record: &Record<'_>) -> io::Result<()> {
        let p = &mut self.printer;
        let out = &mut self.out;
        let payload = record.payload();

        p.print(out, ":", Style::default())?;
        p.print(out, &format!("{:02X}", payload.len()), Color::Fixed(8).normal())?;
        p.print(out, &format!("{:04X}", record.address()), Color::Cyan.normal())?;
        p.print(
            out,
            &format!("{:02X}", record.record_type()),
            type_style(record.record_type()),
        )?;
        let data_style = Color::White.normal();
        for b in payload.iter() {
            p.print(out, &format!("{:02X}", b), data_style)?;
        }
        p.print(out, &format!("{:02X}", record.checksum()), Color::Fixed(8).normal())?;
        p.print(out, "  ", Style::default())?;

        match record {
            Record::Data { offset, bytes } => {
                let addr = (self.abs_high << 16) | u32::from(*offset);
                p.print(out, &format!("{:#010x} ", addr), Style::default())?;
                let ascii: String = bytes
                    .iter()
                    .map(|b| if b.is_ascii_graphic() { *b as char } else { '.' })
                    .collect();
                p.print(out, &ascii, Style::default().dimmed())?;
            }
            Record::ExtendedLinearAddress(high) => {
                self.abs_high = u32::from(*high);
                p.print(out, &format!("page {:#06x}", high), Color::Cyan.bold())?;
            }
            Record::StartLinearAddress(entry) => {
                p.print(out, &format!("entry {:#010x}", entry), Color::Green.bold())?;
            }
            Record::EndOfFile => {
                p.print(out, "end", Color::Red.bold())?;
            }
        }
        p.print(out, "", Style::default())?;
        writeln!(out)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn type_style(record_type: u8) -> Style {
    match record_type {
        types::DATA => Color::Yellow.normal(),
        types::EXTENDED_LINEAR_ADDRESS => Color::Cyan.bold(),
        types::START_LINEAR_ADDRESS => Color::Green.bold(),
        _ => Color::Red.bold(),
    }
}

#[derive(Default, Debug, Clone, Copy)]
struct ColorPrinter {
    last_style: Style,
}

impl ColorPrinter {
    fn print<W: Write>(&mut self, out: &mut W, s: &str, style: Style) -> io::Result<()> {
        if self.last_style != style {
            write!(out, "{}", self.last_style.infix(style))?;
            self.last_style = style;
        }
        write!(out, "{}", s)
    }
}
