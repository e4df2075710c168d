/// Coefficients of an explicit embedded Runge-Kutta pair.
///
/// `b` propagates the solution, `b_tilde` gives the embedded estimate used for
/// the local error. `order` is the exponent denominator for step size control,
/// one more than the lower order of the pair.
pub struct ButcherTableau<const STAGES: usize> {
    pub a: [[f64; STAGES]; STAGES],
    pub b: [f64; STAGES],
    pub b_tilde: [f64; STAGES],
    pub c: [f64; STAGES],
    pub order: usize,
}

impl ButcherTableau<7> {
    // usage is ButcherTableau::<7>::DORMANDPRINCE45
    pub const DORMANDPRINCE45: Self = Self {
        a: [
            [0., 0., 0., 0., 0., 0., 0.],
            [1. / 5., 0., 0., 0., 0., 0., 0.],
            [3. / 40., 9. / 40., 0., 0., 0., 0., 0.],
            [44. / 45., -56. / 15., 32. / 9., 0., 0., 0., 0.],
            [
                19372. / 6561.,
                -25360. / 2187.,
                64448. / 6561.,
                -212. / 729.,
                0.,
                0.,
                0.,
            ],
            [
                9017. / 3168.,
                -355. / 33.,
                46732. / 5247.,
                49. / 176.,
                -5103. / 18656.,
                0.,
                0.,
            ],
            [
                35. / 384.,
                0.,
                500. / 1113.,
                125. / 192.,
                -2187. / 6784.,
                11. / 84.,
                0.,
            ],
        ],
        b: [
            35. / 384.,
            0.,
            500. / 1113.,
            125. / 192.,
            -2187. / 6784.,
            11. / 84.,
            0.,
        ],
        b_tilde: [
            5179. / 57600.,
            0.,
            7571. / 16695.,
            393. / 640.,
            -92097. / 339200.,
            187. / 2100.,
            1. / 40.,
        ],
        c: [0., 1. / 5., 3. / 10., 4. / 5., 8. / 9., 1.0, 1.0],
        order: 5,
    };
}

impl ButcherTableau<6> {
    // usage is ButcherTableau::<6>::FEHLBERG45
    pub const FEHLBERG45: Self = Self {
        a: [
            [0., 0., 0., 0., 0., 0.],
            [1. / 4., 0., 0., 0., 0., 0.],
            [3. / 32., 9. / 32., 0., 0., 0., 0.],
            [1932. / 2197., -7200. / 2197., 7296. / 2197., 0., 0., 0.],
            [439. / 216., -8., 3680. / 513., -845. / 4104., 0., 0.],
            [-8. / 27., 2., -3544. / 2565., 1859. / 4104., -11. / 40., 0.],
        ],
        b: [
            16. / 135.,
            0.,
            6656. / 12825.,
            28561. / 56430.,
            -9. / 50.,
            2. / 55.,
        ],
        b_tilde: [25. / 216., 0., 1408. / 2565., 2197. / 4104., -1. / 5., 0.],
        c: [0., 1. / 4., 3. / 8., 12. / 13., 1., 1. / 2.],
        order: 5,
    };
}
