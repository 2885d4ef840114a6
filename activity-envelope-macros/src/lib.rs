use proc_macro::TokenStream;
use quote::quote;
use syn::{LitStr, parse_macro_input};

/// Creates an `EnvelopeConfig` at compile time from a timing string.
///
/// The string is parsed and validated while compiling, so an invalid timing is a compile
/// error rather than a runtime `Result`.
///
/// # Format
///
/// The format is: `<attack>/<sustain>/<release>[/<policy>]` where:
/// - each duration is a positive number with an optional `ms` or `s` suffix
/// - bare numbers are milliseconds
/// - `policy` is optional, either `fixed` (the default) or `constant`
///
/// # Examples
///
/// ```ignore
/// use activity_envelope::envelope_timing;
///
/// // Milliseconds and seconds can be mixed
/// let config = envelope_timing!("100ms/1s/2s");
///
/// // Constant-duration retriggered attacks
/// let config = envelope_timing!("250/500/1500/constant");
/// ```
#[proc_macro]
pub fn envelope_timing(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as LitStr);
    let timing = input.value();

    match parse_timing(&timing) {
        Ok(Timing {
            attack,
            sustain,
            release,
            constant_duration,
        }) => {
            let expanded = quote! {
                ::activity_envelope::EnvelopeConfig::__from_validated_nanos(
                    #attack,
                    #sustain,
                    #release,
                    #constant_duration,
                )
            };
            TokenStream::from(expanded)
        }
        Err(e) => syn::Error::new(
            input.span(),
            format!("invalid envelope timing '{}': {}", timing, e),
        )
        .to_compile_error()
        .into(),
    }
}

#[derive(Debug, PartialEq)]
struct Timing {
    attack: u64,
    sustain: u64,
    release: u64,
    constant_duration: bool,
}

fn parse_timing(s: &str) -> Result<Timing, String> {
    let segments: Vec<&str> = s.split('/').map(str::trim).collect();
    if !(3..=4).contains(&segments.len()) {
        return Err(format!(
            "expected 3 or 4 '/'-separated segments, found {}",
            segments.len()
        ));
    }

    let attack = parse_nanos("attack", segments[0])?;
    let sustain = parse_nanos("sustain", segments[1])?;
    let release = parse_nanos("release", segments[2])?;

    let constant_duration = match segments.get(3).map(|p| p.to_ascii_lowercase()) {
        None => false,
        Some(p) if p == "fixed" || p == "fixed_rate" => false,
        Some(p) if p == "constant" || p == "constant_duration" => true,
        Some(p) => return Err(format!("unknown retrigger policy '{}'", p)),
    };

    Ok(Timing {
        attack,
        sustain,
        release,
        constant_duration,
    })
}

/// Parses one duration segment into whole nanoseconds.
fn parse_nanos(phase: &str, text: &str) -> Result<u64, String> {
    let (number, scale) = if let Some(n) = text.strip_suffix("ms") {
        (n, 1e6)
    } else if let Some(n) = text.strip_suffix('s') {
        (n, 1e9)
    } else {
        (text, 1e6)
    };

    let value = number
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("{} duration '{}' is not a valid duration", phase, text))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(format!(
            "{} duration must be a finite, positive number, got '{}'",
            phase, text
        ));
    }

    let nanos = (value * scale).round();
    if nanos >= u64::MAX as f64 {
        return Err(format!("{} duration '{}' is out of range", phase, text));
    }
    if nanos < 1.0 {
        return Err(format!("{} duration must be greater than zero", phase));
    }
    Ok(nanos as u64)
}
