//! Generator options.
//!
//! Options are declared once in the `options!` invocation below with a type, a validator and a
//! default. `Options::default()` starts from the defaults and then applies any environment
//! variable named `CLOSUREGEN_<OPTION>` (for example `CLOSUREGEN_ARRAY_CHUNK_SIZE=512`).
//! Invalid values in the environment are logged and ignored; invalid values passed to
//! [`Options::set_from_str`] are returned as errors.

use crate::util::constants::*;
use crate::util::error::{GenError, Result};

/// Environment variables with this prefix are read as options.
pub const ENV_PREFIX: &str = "CLOSUREGEN_";

fn always_valid<T>(_: &T) -> bool {
    true
}

fn valid_cache_line(v: &usize) -> bool {
    v.is_power_of_two() && *v % BYTES_IN_HEAP_REF == 0
}

macro_rules! options {
    ($($(#[$doc:meta])* $name:ident: $type:ty[$validator:expr] = $default:expr),*,) => [
        options!($($(#[$doc])* $name: $type[$validator] = $default),*);
    ];
    ($($(#[$doc:meta])* $name:ident: $type:ty[$validator:expr] = $default:expr),*) => [
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct Options {
            $($(#[$doc])* pub $name: $type),*
        }

        impl Options {
            /// The built-in defaults, ignoring the environment.
            pub fn builtin() -> Self {
                Options {
                    $($name: $default),*
                }
            }

            /// Set one option from its string form. The option keeps its old value on error.
            pub fn set_from_str(&mut self, s: &str, val: &str) -> Result<()> {
                let invalid = |reason: &str| GenError::Options {
                    name: s.to_string(),
                    value: val.to_string(),
                    reason: reason.to_string(),
                };
                match s {
                    $(stringify!($name) => {
                        // Parse the given value to the right type, then validate it.
                        let parsed = val.parse::<$type>().map_err(|_| invalid("cannot parse value"))?;
                        let validate_fn = $validator;
                        if !validate_fn(&parsed) {
                            return Err(invalid("value rejected by validator"));
                        }
                        trace!("Option {} set to {:?}", s, parsed);
                        self.$name = parsed;
                        Ok(())
                    })*
                    _ => Err(invalid("no such option")),
                }
            }

            /// Apply every `CLOSUREGEN_*` environment variable that names an option.
            pub fn read_env_var_settings(&mut self) {
                for (key, val) in std::env::vars() {
                    // strip the prefix, and get the lower case string
                    if let Some(rest_of_key) = key.strip_prefix(ENV_PREFIX) {
                        let lowercase: &str = &rest_of_key.to_lowercase();
                        match lowercase {
                            $(stringify!($name) => {
                                if let Err(e) = self.set_from_str(lowercase, &val) {
                                    warn!("{}. Default value will be used.", e);
                                }
                            },)*
                            _ => {}
                        }
                    }
                }
            }
        }

        impl Default for Options {
            fn default() -> Self {
                let mut options = Options::builtin();
                options.read_env_var_settings();
                options
            }
        }
    ]
}

// The chunked loops read the collector's globals for T, C and A. The values configured here
// are rendered into an assertion at the top of each loop and drive `ChunkPartition`.
options! {
    /// Arrays with more elements than this are chunked by the parallel marking variants (T).
    array_chunk_threshold: usize [|v: &usize| *v > 0] = DEFAULT_ARRAY_CHUNK_THRESHOLD,
    /// The number of elements in one enqueued chunk (C).
    array_chunk_size:      usize [|v: &usize| *v > 0] = DEFAULT_ARRAY_CHUNK_SIZE,
    /// Chunk boundaries are aligned to this many bytes (A).
    cache_line_bytes:      usize [valid_cache_line]   = BYTES_IN_CACHE_LINE,
    /// Render excluded fields and deferred links as comments in the generated bodies.
    emit_audit_comments:   bool  [always_valid]       = false,
}
