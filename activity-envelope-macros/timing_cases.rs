// Timing strings and the `(attack, sustain, release, constant_duration)` nanoseconds they
// parse to, or `None` when they are rejected. Both the `FromStr` parser and
// `envelope_timing!` are tested against this table.
const TIMING_CASES: &[(&str, Option<(u64, u64, u64, bool)>)] = &[
    (
        "100/200/300",
        Some((100_000_000, 200_000_000, 300_000_000, false)),
    ),
    (
        "100ms/1s/2s",
        Some((100_000_000, 1_000_000_000, 2_000_000_000, false)),
    ),
    (
        "1.5s/250/0.25ms",
        Some((1_500_000_000, 250_000_000, 250_000, false)),
    ),
    (
        " 10 / 20ms / 30 s / constant ",
        Some((10_000_000, 20_000_000, 30_000_000_000, true)),
    ),
    (
        "10/20/30/CONSTANT_DURATION",
        Some((10_000_000, 20_000_000, 30_000_000, true)),
    ),
    (
        "10/20/30/fixed_rate",
        Some((10_000_000, 20_000_000, 30_000_000, false)),
    ),
    ("", None),
    ("10/20", None),
    ("10/20/30/40/50", None),
    ("10//30", None),
    ("10/abc/30", None),
    ("10/20/30/maybe", None),
    ("0/20/30", None),
    ("10/-5ms/30", None),
    ("10/20/inf", None),
    ("10/20/NaN", None),
    // Rounds to zero nanoseconds
    ("1e-7/20/30", None),
    ("1e30s/20/30", None),
];
