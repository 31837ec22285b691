//! Section decoding: interprets a section `code` against a cursor positioned
//! into an observation block, mutating the shared `ClassDescriptor`.

use crate::cursor::Cursor;
use crate::descriptor::{ClassDescriptor, UnsupportedSection};
use crate::Result;

/// Populate `desc` from the section at `obs_block[4*(addr-1)..]`, per `code`
/// and `len` (section length in words). Offsets within the decoder are
/// sequential from the section base; `len` is only reinterpreted for the
/// `-2` and `-3` length-dependent layouts, exactly as the format requires.
pub fn fill_header(
    obs_block: &[u8],
    code: i32,
    addr: i64,
    len: i64,
    desc: &mut ClassDescriptor,
) -> Result<()> {
    let byte_off = 4 * (addr - 1) as usize;
    if byte_off > obs_block.len() {
        log::warn!(
            "section code {} at word {} falls outside the {}-byte observation block",
            code,
            addr,
            obs_block.len()
        );
        return Ok(());
    }

    let mut cur = Cursor::new(&obs_block[byte_off..]);

    match code {
        -2 => {
            let g = &mut desc.general;
            g.ut = cur.read_f64()?;
            g.st = cur.read_f64()?;
            g.az = cur.read_f32()?;
            g.el = cur.read_f32()?;
            g.tau = cur.read_f32()?;
            g.tsys = cur.read_f32()?;
            g.time = cur.read_f32()?;
            g.xunit = if len > 9 { cur.read_i32()? } else { 0 };
        }
        -3 => {
            let p = &mut desc.position;
            if len == 17 {
                p.source = cur.read_str(12)?;
                p.epoch = cur.read_f32()?;
                p.lam = cur.read_f64()?;
                p.bet = cur.read_f64()?;
                p.lamof = cur.read_f32()?;
                p.betof = cur.read_f32()?;
                p.proj = cur.read_i32()?;
                p.sl0p = cur.read_f64()?;
                p.sb0p = cur.read_f64()?;
                p.sk0p = cur.read_f64()?;
            } else {
                p.source = cur.read_str(12)?;
                p.system = cur.read_i32()?;
                p.epoch = cur.read_f32()?;
                p.proj = cur.read_i32()?;
                p.lam = cur.read_f64()?;
                p.bet = cur.read_f64()?;
                p.projang = cur.read_f64()?;
                p.lamof = cur.read_f32()?;
                p.betof = cur.read_f32()?;
            }
        }
        -4 => {
            let s = &mut desc.spectroscopic;
            s.line = cur.read_str(12)?;
            s.restf = cur.read_f64()?;
            s.nchan = cur.read_i32()?;
            s.rchan = cur.read_f32()?;
            s.fres = cur.read_f32()?;
            s.foff = cur.read_f32()?;
            s.vres = cur.read_f32()?;
            s.voff = cur.read_f32()?;
            s.badl = cur.read_f32()?;
            s.image = cur.read_f64()?;
            s.vtype = cur.read_i32()?;
            s.doppler = cur.read_f64()?;
        }
        -10 => {
            let c = &mut desc.continuum;
            c.freq = cur.read_f64()?;
            c.width = cur.read_f32()?;
            c.npoin = cur.read_i32()?;
            c.rpoin = cur.read_f32()?;
            c.tref = cur.read_f32()?;
            c.aref = cur.read_f32()?;
            c.apos = cur.read_f32()?;
            c.tres = cur.read_f32()?;
            c.ares = cur.read_f32()?;
            c.badc = cur.read_f32()?;
            c.ctype = cur.read_i32()?;
            c.cimag = cur.read_f64()?;
            c.colla = cur.read_f32()?;
            c.colle = cur.read_f32()?;
        }
        -14 => {
            let c = &mut desc.calibration;
            c.beeff = cur.read_f32()?;
            c.foeff = cur.read_f32()?;
            c.gaini = cur.read_f32()?;
            c.h2omm = cur.read_f32()?;
            c.pamb = cur.read_f32()?;
            c.tamb = cur.read_f32()?;
            c.tatms = cur.read_f32()?;
            c.tchop = cur.read_f32()?;
            c.tcold = cur.read_f32()?;
            c.taus = cur.read_f32()?;
            c.taui = cur.read_f32()?;
            c.tatmi = cur.read_f32()?;
            c.trec = cur.read_f32()?;
            c.cmode = cur.read_i32()?;
            c.atfac = cur.read_f32()?;
            c.alti = cur.read_f32()?;
            c.count[0] = cur.read_f32()?;
            c.count[1] = cur.read_f32()?;
            c.count[2] = cur.read_f32()?;
            c.lcalof = cur.read_f32()?;
            c.bcalof = cur.read_f32()?;
            c.geolong = cur.read_f64()?;
            c.geolat = cur.read_f64()?;
        }
        -5 | -6 | -7 | -8 | -9 => {
            let n_bytes = (len.max(0) as usize) * 4;
            let end = byte_off + n_bytes;
            if end <= obs_block.len() {
                desc.unsupported.push(UnsupportedSection {
                    code,
                    raw: obs_block[byte_off..end].to_vec(),
                });
            } else {
                log::debug!(
                    "section code {} claims {} bytes but only {} are available; dropping",
                    code,
                    n_bytes,
                    obs_block.len() - byte_off
                );
            }
        }
        _ => {
            log::warn!("cannot handle CLASS section code {} yet", code);
        }
    }

    Ok(())
}
