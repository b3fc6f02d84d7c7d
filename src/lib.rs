// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Emulator for the LS-8, a small 8-bit machine with eight registers, a
//! downward growing stack and a 256 byte address space.

extern crate chrono;
#[macro_use]
extern crate enum_primitive;
extern crate num;
extern crate rustyline;

pub mod debugger;
pub mod io;
pub mod ls8;
