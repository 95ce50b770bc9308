//! Link-time switches.
//!
//! Both switches can be forced on from the environment, which is handy when debugging an
//! application that links programs itself:
//! - `SHADERLINK_DUMP_IR=1` writes each lowered stage to the `shaderlink::dump` tracing target.
//! - `SHADERLINK_VALIDATE_IR=1` validates the IR before and after lowering.

/// Env var that enables IR dumps.
pub const DUMP_IR_ENV: &str = "SHADERLINK_DUMP_IR";

/// Env var that enables IR validation around each pass.
pub const VALIDATE_IR_ENV: &str = "SHADERLINK_VALIDATE_IR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    pub dump_ir: bool,
    pub validate_ir: bool,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            dump_ir: false,
            validate_ir: cfg!(debug_assertions),
        }
    }
}

impl LinkOptions {
    /// Defaults, with each switch forced on when its env var is truthy.
    pub fn from_env() -> Self {
        Self::default().with_overrides(env_var_truthy(DUMP_IR_ENV), env_var_truthy(VALIDATE_IR_ENV))
    }

    fn with_overrides(mut self, dump_ir: bool, validate_ir: bool) -> Self {
        self.dump_ir |= dump_ir;
        self.validate_ir |= validate_ir;
        self
    }
}

fn env_var_truthy(name: &str) -> bool {
    let Ok(raw) = std::env::var(name) else {
        return false;
    };
    is_truthy(&raw)
}

fn is_truthy(raw: &str) -> bool {
    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        for v in ["1", "true", "TRUE", " yes ", "On"] {
            assert!(is_truthy(v), "{v:?}");
        }
        for v in ["", "0", "false", "off", "2"] {
            assert!(!is_truthy(v), "{v:?}");
        }
    }

    #[test]
    fn overrides_only_turn_switches_on() {
        let base = LinkOptions {
            dump_ir: false,
            validate_ir: true,
        };
        assert_eq!(
            base.with_overrides(true, false),
            LinkOptions {
                dump_ir: true,
                validate_ir: true,
            }
        );
        assert_eq!(base.with_overrides(false, false), base);
    }
}
