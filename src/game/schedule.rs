//! Natural debris schedule.
//!
//! Both lanes receive the same scripted stream: bursts separated by quiet
//! breaks, two boss units, then an open-ended phase where health grows by
//! 15% every hundred turns.

/// Debris to spawn on every lane at `turn`, as `(cooldown, health)`.
#[must_use]
pub fn debris_schedule(turn: u32) -> Option<(u32, u32)> {
    match turn {
        0..200 => (turn % 20 == 19).then_some((20, 10)),
        200..250 | 500..550 | 750..800 | 1200..1250 | 1500..1551 | 1552..2400 => None,
        250..500 => (turn % 30 == 29).then_some((14, 30)),
        550..750 => (turn % 60 < 20).then_some((14, 16)),
        800..1200 => {
            if turn % 50 == 45 {
                Some((10, 80))
            } else {
                (turn % 3 == 1).then_some((10, 15))
            }
        }
        1250..1500 => speed_mixup(turn),
        1551 | 3051 => Some((100, 4500)),
        2400..2700 => Some(if turn % 30 == 25 { (8, 200) } else { (5, 50) }),
        2700..2750 | 3000..3051 | 3052..3200 => None,
        2750..3000 => (turn % 2 == 1).then_some((2, 60)),
        3200..3700 => (turn % 20 == 1).then_some((5, 300)),
        _ => end_game(turn),
    }
}

fn speed_mixup(turn: u32) -> Option<(u32, u32)> {
    const WAVES: [(u32, (u32, u32)); 6] = [
        (7, (6, 25)),
        (13, (8, 30)),
        (17, (12, 45)),
        (23, (16, 60)),
        (41, (40, 300)),
        (101, (60, 1500)),
    ];
    WAVES
        .iter()
        .find(|&&(modulus, _)| turn % modulus == modulus - 1)
        .map(|&(_, debris)| debris)
}

fn end_game(turn: u32) -> Option<(u32, u32)> {
    let strength = f64::from(turn - 3700) / 100.0;
    let scale = |base: f64| {
        let health = (base * 1.15_f64.powf(strength)).floor();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let health = health.min(f64::from(u32::MAX)) as u32;
        health
    };
    if turn % 200 < 100 {
        (turn % 20 == 19).then(|| (5, scale(300.0)))
    } else if turn % 200 == 101 {
        Some((100, scale(4500.0)))
    } else {
        None
    }
}
