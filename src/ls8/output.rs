// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io::Result;
use std::io::Write;

/// Where PRN sends register values. Anything that implements `Write` works,
/// values are written in decimal, one per line.
pub trait OutputSink {
    fn emit(&mut self, value: u8) -> Result<()>;
}

impl<W: Write> OutputSink for W {
    fn emit(&mut self, value: u8) -> Result<()> {
        writeln!(self, "{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_written_one_per_line() {
        let mut out: Vec<u8> = Vec::new();
        out.emit(72).unwrap();
        out.emit(0).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "72\n0\n");
    }
}
