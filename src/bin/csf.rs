/*
 *
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::{ArgGroup, Parser};
use csf::func::{Csf, Degree};
use csf::utils::{FileLineLender, GzipLineLender, LineLender, ZstdLineLender};
use dsi_progress_logger::*;
use lender::Lender;
use std::io::{BufRead, BufWriter, Write};

#[derive(Parser, Debug)]
#[command(about = "Load a compressed static function and query it", long_about = None)]
#[clap(group(
            ArgGroup::new("input")
                .required(true)
                .args(&["filename", "n"]),
))]
struct Args {
    /// The serialized function.
    func: String,
    #[arg(short, long)]
    /// A file containing UTF-8 keys, one per line.
    filename: Option<String>,
    #[arg(short)]
    /// Use the 64-bit keys [0..n). Mainly useful for testing and debugging.
    n: Option<u64>,
    /// The filename containing the keys is compressed with zstd.
    #[arg(short, long, conflicts_with = "gzip")]
    zstd: bool,
    /// The filename containing the keys is compressed with gzip.
    #[arg(short, long)]
    gzip: bool,
    /// The function reads four variables per key.
    #[arg(long)]
    four: bool,
    /// Print each key followed by a tab and its value.
    #[arg(short, long)]
    print: bool,
}

fn query_lines<B: BufRead>(
    csf: &Csf,
    mut lender: LineLender<B>,
    print: bool,
    pl: &mut ProgressLogger,
) -> Result<u64> {
    let mut out = BufWriter::new(std::io::stdout().lock());
    let mut xor = 0;
    while let Some(line) = lender.next() {
        let key = line?;
        let value = csf.lookup_bytes(key);
        if print {
            writeln!(out, "{}\t{}", key, value)?;
        }
        xor ^= value;
        pl.light_update();
    }
    out.flush()?;
    Ok(xor)
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;

    let args = Args::parse();

    let mut csf = Csf::load_file(&args.func)?;
    if args.four {
        csf = csf.with_degree(Degree::Four);
    }

    let mut pl = ProgressLogger::default();
    pl.item_name("key");
    pl.start("Querying...");

    let xor = if let Some(filename) = &args.filename {
        if args.zstd {
            query_lines(&csf, ZstdLineLender::from_path(filename)?, args.print, &mut pl)?
        } else if args.gzip {
            query_lines(&csf, GzipLineLender::from_path(filename)?, args.print, &mut pl)?
        } else {
            query_lines(&csf, FileLineLender::from_path(filename)?, args.print, &mut pl)?
        }
    } else {
        let mut out = BufWriter::new(std::io::stdout().lock());
        let mut xor = 0;
        for key in 0..args.n.unwrap_or(0) {
            let value = csf.lookup_u64(key);
            if args.print {
                writeln!(out, "{}\t{}", key, value)?;
            }
            xor ^= value;
            pl.light_update();
        }
        out.flush()?;
        xor
    };

    pl.done();
    log::info!("XOR of all values: {}", xor);
    Ok(())
}
