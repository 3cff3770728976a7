/*
 *
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Utility wrappers for key files.

Keys are read one per line from a [plain file](FileLineLender), or from a
file compressed with [Zstandard](ZstdLineLender) or [gzip](GzipLineLender).

*/

use flate2::read::GzDecoder;
use lender::*;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use zstd::stream::read::Decoder;

/**

A structure lending the lines coming from a [`BufRead`] as `&str`.

The lines are read into a reusable internal string buffer that
grows as needed. Line terminators (`\n` or `\r\n`) are removed.

For convenience, we implement [`From`] from [`BufRead`].

*/
pub struct LineLender<B> {
    buf: B,
    line: String,
}

impl<B> LineLender<B> {
    pub fn new(buf: B) -> Self {
        LineLender {
            buf,
            line: String::with_capacity(128),
        }
    }
}

/// Lends the lines of an uncompressed file.
pub type FileLineLender = LineLender<BufReader<File>>;

impl FileLineLender {
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(LineLender::new(BufReader::new(File::open(path)?)))
    }
}

impl<B> From<B> for LineLender<B> {
    fn from(buf: B) -> Self {
        LineLender::new(buf)
    }
}

impl<'lend, B: BufRead> Lending<'lend> for LineLender<B> {
    type Lend = io::Result<&'lend str>;
}

impl<B: BufRead> Lender for LineLender<B> {
    fn next(&mut self) -> Option<Lend<'_, Self>> {
        self.line.clear();
        match self.buf.read_line(&mut self.line) {
            Err(e) => Some(Err(e)),
            Ok(0) => None,
            Ok(_) => {
                if self.line.ends_with('\n') {
                    self.line.pop();
                    if self.line.ends_with('\r') {
                        self.line.pop();
                    }
                }
                Some(Ok(&self.line))
            }
        }
    }
}

/// Lends the lines of a file compressed with Zstandard.
pub type ZstdLineLender = LineLender<BufReader<Decoder<'static, BufReader<File>>>>;

impl ZstdLineLender {
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(LineLender::new(BufReader::new(Decoder::new(File::open(path)?)?)))
    }
}

/// Lends the lines of a file compressed with gzip.
pub type GzipLineLender = LineLender<BufReader<GzDecoder<File>>>;

impl GzipLineLender {
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(LineLender::new(BufReader::new(GzDecoder::new(File::open(path)?))))
    }
}
