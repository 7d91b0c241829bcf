//! Name → algorithm lookup.
//!
//! The table is built once on first use and never mutated. Lookup is
//! case-insensitive. [`MethodRegistry::get`] keeps the lenient policy of
//! falling back to Adam for unknown names (with a warning);
//! [`MethodRegistry::get_strict`] reports them as errors instead.

use crate::adam::AdamRunner;
use crate::adaptive::AdaptiveRunner;
use crate::bfgs::BfgsRunner;
use crate::cg::CgRunner;
use crate::config::defaults;
use crate::context::{RunContext, RunResult};
use crate::error::{OptError, OptResult};
use crate::ga::GaRunner;
use crate::gd::GdRunner;
use crate::objective::ObjectiveAdapter;
use crate::pso::PsoRunner;
use crate::sa::SaRunner;
use log::warn;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Signature shared by every registered algorithm.
pub type Algorithm = fn(&mut RunContext, &ObjectiveAdapter) -> OptResult<RunResult>;

static METHODS: Lazy<BTreeMap<&'static str, Algorithm>> = Lazy::new(|| {
    let entries: [(&'static str, Algorithm); 10] = [
        (GdRunner::NAME, GdRunner::run),
        (AdamRunner::NAME, AdamRunner::run),
        (BfgsRunner::NAME, BfgsRunner::run),
        (CgRunner::NAME, CgRunner::run),
        (GaRunner::NAME, GaRunner::run),
        (PsoRunner::NAME, PsoRunner::run),
        (SaRunner::NAME, SaRunner::run),
        ("momentum", AdaptiveRunner::momentum),
        ("rmsprop", AdaptiveRunner::rmsprop),
        ("adagrad", AdaptiveRunner::adagrad),
    ];
    entries.into_iter().collect()
});

/// Legacy names kept for compatibility, mapped to their registered method.
const ALIASES: &[(&str, &str)] = &[("newton_cg", CgRunner::NAME)];

/// Immutable registry of the built-in methods.
///
/// # Examples
///
/// ```
/// use u_optflow::MethodRegistry;
///
/// assert_eq!(MethodRegistry::resolve("BFGS"), "bfgs");
/// assert_eq!(MethodRegistry::resolve("no_such_method"), "adam");
/// assert!(MethodRegistry::get_strict("no_such_method").is_err());
/// ```
pub struct MethodRegistry;

impl MethodRegistry {
    /// Method used for unknown names.
    pub const DEFAULT: &'static str = defaults::PRIMARY_METHOD;

    /// Canonical registered name for `name`, or `None` if it is unknown.
    ///
    /// Legacy aliases resolve with a warning.
    pub fn canonical(name: &str) -> Option<&'static str> {
        let key = name.trim().to_ascii_lowercase();
        if let Some((&registered, _)) = METHODS.get_key_value(key.as_str()) {
            return Some(registered);
        }
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == key)
            .map(|&(alias, target)| {
                warn!("method `{alias}` is a legacy alias of `{target}` (nonlinear conjugate gradient, no Hessian)");
                target
            })
    }

    /// Canonical name with the lenient fallback applied.
    pub fn resolve(name: &str) -> &'static str {
        Self::canonical(name).unwrap_or_else(|| {
            warn!("unknown optimization method `{name}`, falling back to `{}`", Self::DEFAULT);
            Self::DEFAULT
        })
    }

    /// Looks up `name`, falling back to Adam when it is unknown.
    pub fn get(name: &str) -> Algorithm {
        let resolved = Self::resolve(name);
        METHODS
            .get(resolved)
            .copied()
            .unwrap_or(AdamRunner::run as Algorithm)
    }

    /// Looks up `name`, failing with [`OptError::UnknownMethod`] when it is
    /// not registered.
    pub fn get_strict(name: &str) -> OptResult<Algorithm> {
        Self::canonical(name)
            .and_then(|registered| METHODS.get(registered).copied())
            .ok_or_else(|| OptError::UnknownMethod(name.to_string()))
    }

    /// Registered names in sorted order. Aliases are not listed.
    pub fn names() -> Vec<&'static str> {
        METHODS.keys().copied().collect()
    }

    pub fn contains(name: &str) -> bool {
        Self::canonical(name).is_some()
    }
}
