//! # bandfit-core
//!
//! Iterative proportional fitting (IPF) with *bandwidth* margins.
//!
//! ---
//!
//! Classical IPF rescales a matrix of relative weights until every row sum and
//! column sum hits a fixed target. Here each margin only has to land inside an
//! allowed interval `[min, max]`. Margins already inside their band are left
//! alone; margins outside are pulled to the nearest edge. Fixed margins are the
//! special case `min == max`.
//!
//! The typical use is trip distribution in aggregated transport demand models
//! where production, attraction, or both are flexible. With fixed margins a few
//! dominant origins can obliterate the distribution encoded in the weights;
//! bands keep it intact wherever the constraints allow.
//!
//! ## The loop
//!
//! ```text
//! weights ─► margins ─► correction factors ─► total gap ─► stop?
//!               ▲                                            │ no
//!               └──────── scale columns, then rows ◄─────────┘
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`bandwidth`] | [`Bandwidth`], [`MarginStatus`] | Margin intervals; correction factor and distance to band |
//! | [`matrix`] | [`Matrix`], [`Grid`] | Dense row-major storage; any `[[f64; C]; R]` also fits in place |
//! | [`fitter`] | [`BandwidthFitter`], [`FitReport`], [`FitOutcome`] | The fitting loop and its stopping criteria |
//! | [`error`] | [`FitError`] | Shape and settings errors caught before fitting |
//! | `problem` | `FitProblem` | Serialisable problem document (requires `serde` feature) |
//! | `ffi` | `ipf_minmax` | Python bindings (requires `python-ffi` feature) |
//!
//! ## Example
//!
//! ```
//! use bandfit_core::{BandwidthFitter, Matrix};
//!
//! let m = Matrix::from_rows(&[[1.0, 1.0], [1.0, 3.0]]).unwrap();
//! let outcome = BandwidthFitter::default()
//!     .fit(m, &[4.0, 8.0], &[4.0, 8.0], &[0.0, 0.0], &[100.0, 100.0])
//!     .unwrap();
//! assert!(outcome.report.converged());
//! assert_eq!(outcome.matrix.row_sums(), vec![4.0, 8.0]);
//! ```
//!
//! ## `no_std`
//!
//! The crate is `#![no_std]` with `alloc` by default. Enable `std` to get
//! `std::error::Error` through `thiserror`'s std support, `serde` for
//! serialisation, and `python-ffi` for the PyO3 extension module.

#![cfg_attr(not(any(feature = "std", feature = "python-ffi")), no_std)]
#![cfg_attr(not(feature = "python-ffi"), deny(unsafe_code))]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

#[cfg(any(feature = "std", feature = "python-ffi"))]
extern crate std;

pub mod bandwidth;
pub mod error;
pub mod fitter;
pub mod matrix;
#[cfg(feature = "serde")]
pub mod problem;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use bandwidth::{Axis, Bandwidth, MarginStatus};
pub use error::{FitError, Result};
pub use fitter::{fit, BandwidthFitter, FitOutcome, FitReport, StallPolicy, StopReason};
pub use matrix::{Grid, Matrix};
