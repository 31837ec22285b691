//! The public, per-scan spectrum header assembled from a `ClassDescriptor`
//! plus its directory entry, independent of which file layout produced it.

use chrono::{TimeZone, Utc};

use crate::descriptor::ClassDescriptor;
use crate::directory::DirectoryEntry;
use crate::FlexString;

/// A fully decoded scan header: locating information from the directory,
/// the derived astronomical quantities, and the raw section state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumHeader {
    /// 1-based position of this scan among all enumerated scans.
    pub id: i64,
    /// The observer-assigned scan number (`xscan`).
    pub scan_num: i64,
    pub target: FlexString,
    pub line: FlexString,
    pub instrument: FlexString,
    /// Right ascension, degrees.
    pub ra: f64,
    /// Declination, degrees.
    pub dec: f64,
    /// Local-oscillator frequency, MHz: `(rest_freq + image_freq) / 2`.
    pub lo_frequency: f64,
    /// Rest (spectrum) or reference (continuum) frequency, MHz.
    pub f0: f64,
    /// Frequency resolution, MHz.
    pub df: f32,
    /// Source LSR velocity offset.
    pub vs: f32,
    /// Integration time, seconds.
    pub dt: f32,
    pub tsys: f32,
    /// Seconds since the Unix epoch.
    pub utc: f64,
    /// Channel count of the data/frequency vectors (`ndata`).
    pub num_channels: i64,
    /// Reference channel used by the frequency-axis law (`rchan`/`rpoin`).
    pub reference_channel: f32,
    pub descriptor: ClassDescriptor,
}

/// Days between the CLASS date origin (MJD 60549) and the Unix epoch (MJD
/// 40587), folded into the additive constant the format's day numbers use:
/// `xdobs + 60549 - 40587`.
const MJD_TO_UNIX_DAY_OFFSET: f64 = 60549.0 - 40587.0;

/// Convert a CLASS observation day number (`xdobs`, *not* yet offset to
/// MJD) and UT time-of-day (in radians) to seconds since the Unix epoch.
pub fn obs_seconds(xdobs: f64, ut: f64) -> f64 {
    (xdobs + MJD_TO_UNIX_DAY_OFFSET) * 86400.0 + (ut * 3600.0 * 12.0 / std::f64::consts::PI).floor()
}

/// Build the full public header for scan `id` from its directory entry and
/// decoded section descriptor. `xkind == 0` selects the spectrum branch;
/// any other kind is a continuum drift, drawing its quantities from the
/// continuum section instead of the spectroscopic one.
pub fn normalize(id: i64, entry: &DirectoryEntry, desc: &ClassDescriptor) -> SpectrumHeader {
    let is_spectrum = entry.kind == 0;

    let (f0, lo_frequency, df, num_channels, reference_channel) = if is_spectrum {
        (
            desc.spectroscopic.restf,
            (desc.spectroscopic.restf + desc.spectroscopic.image) / 2.0,
            desc.spectroscopic.fres,
            desc.spectroscopic.nchan as i64,
            desc.spectroscopic.rchan,
        )
    } else {
        (
            desc.continuum.freq,
            (desc.continuum.freq + desc.continuum.cimag) / 2.0,
            desc.continuum.tres,
            desc.continuum.npoin as i64,
            desc.continuum.rpoin,
        )
    };

    let lam = desc.position.lam + (desc.position.lamof as f64) / desc.position.bet.cos();
    let bet = desc.position.bet + desc.position.betof as f64;
    let utc = obs_seconds(entry.xdobs as f64, desc.general.ut);

    SpectrumHeader {
        id,
        scan_num: entry.scan_num,
        target: entry.source.clone(),
        line: entry.line.clone(),
        instrument: entry.telescope.clone(),
        ra: lam.to_degrees(),
        dec: bet.to_degrees(),
        lo_frequency,
        f0,
        df,
        vs: desc.spectroscopic.voff,
        dt: desc.general.time,
        tsys: desc.general.tsys,
        utc,
        num_channels,
        reference_channel,
        descriptor: desc.clone(),
    }
}

/// Build the frequency axis: `f[k] = (k + 1 - rchan) * df + f0`, falling
/// back to plain 1-based channel index when the resolution is zero.
pub fn frequency_vector(header: &SpectrumHeader) -> Vec<f64> {
    let n = header.num_channels.max(0) as usize;
    let df = header.df as f64;
    let f0 = header.f0;
    let rchan = header.reference_channel as f64;

    (0..n)
        .map(|k| {
            if df == 0.0 {
                (k + 1) as f64
            } else {
                (k as f64 + 1.0 - rchan) * df + f0
            }
        })
        .collect()
}

impl SpectrumHeader {
    /// Format a single summary line: id, scan number, target, line,
    /// instrument, RA/Dec, fLO/f0/df, vs, dt, tsys, and a UTC timestamp.
    pub fn print_line(&self) -> String {
        let secs = self.utc.floor() as i64;
        let timestamp = Utc
            .timestamp_opt(secs, 0)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "????-??-?? ??:??:??".to_string());

        format!(
            "{:4} {:8} '{:<12}' '{:<12}' '{:<12}' {:8.4} {:8.4} {:10.3} {:10.3} {:7.3} {:+7.1} {:5.1} {:6.1} '{}'",
            self.id,
            self.scan_num,
            self.target.as_str(),
            self.line.as_str(),
            self.instrument.as_str(),
            self.ra,
            self.dec,
            self.lo_frequency,
            self.f0,
            self.df,
            self.vs,
            self.dt,
            self.tsys,
            timestamp
        )
    }
}
