use std::fmt;
use std::str::FromStr;

use num_traits::Float;

use crate::convergence::{cst, dot, norm};
use crate::error::ConfigError;

/// Nonlinear conjugate-gradient update formula.
///
/// With `g = g_k`, `g' = g_{k-1}`, `d' = d_{k-1}` and `y = g - g'`, the next
/// direction is `d_k = -g + β·d'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CgdBeta {
    /// Hestenes-Stiefel: `g·y / d'·y`.
    HestenesStiefel,
    /// Fletcher-Reeves: `g·g / g'·g'`.
    FletcherReeves,
    /// Polak-Ribière-Polyak, clamped at zero: `max(0, g·y / g'·g')`.
    PolakRibiere,
    /// Conjugate descent (Fletcher): `g·g / -d'·g'`.
    ConjugateDescent,
    /// Liu-Storey: `g·y / -d'·g'`.
    LiuStorey,
    /// Dai-Yuan: `g·g / d'·y`.
    DaiYuan,
    /// Hager-Zhang, with the lower bound `-1 / (|d'|·min(0.01, |g'|))`.
    HagerZhang,
    /// `max(0, min(DY, CD))`.
    DaiYuanCd,
    /// `max(0, min(DY, HS))`.
    DaiYuanHs,
}

impl CgdBeta {
    /// All formulas, in declaration order.
    pub const ALL: [CgdBeta; 9] = [
        CgdBeta::HestenesStiefel,
        CgdBeta::FletcherReeves,
        CgdBeta::PolakRibiere,
        CgdBeta::ConjugateDescent,
        CgdBeta::LiuStorey,
        CgdBeta::DaiYuan,
        CgdBeta::HagerZhang,
        CgdBeta::DaiYuanCd,
        CgdBeta::DaiYuanHs,
    ];

    /// Short name (`hs`, `fr`, `prp`, `cd`, `ls`, `dy`, `n`, `dycd`, `dyhs`).
    pub fn name(self) -> &'static str {
        match self {
            CgdBeta::HestenesStiefel => "hs",
            CgdBeta::FletcherReeves => "fr",
            CgdBeta::PolakRibiere => "prp",
            CgdBeta::ConjugateDescent => "cd",
            CgdBeta::LiuStorey => "ls",
            CgdBeta::DaiYuan => "dy",
            CgdBeta::HagerZhang => "n",
            CgdBeta::DaiYuanCd => "dycd",
            CgdBeta::DaiYuanHs => "dyhs",
        }
    }

    /// Compute `β` from the previous gradient and direction and the current gradient.
    pub fn beta<F: Float>(self, g_prev: &[F], d_prev: &[F], g: &[F]) -> F {
        let terms = Terms::new(g_prev, d_prev, g);
        match self {
            CgdBeta::HestenesStiefel => terms.hs(),
            CgdBeta::FletcherReeves => terms.fr(),
            CgdBeta::PolakRibiere => terms.prp().max(F::zero()),
            CgdBeta::ConjugateDescent => terms.cd(),
            CgdBeta::LiuStorey => terms.ls(),
            CgdBeta::DaiYuan => terms.dy(),
            CgdBeta::HagerZhang => terms.hz(norm(d_prev), norm(g_prev)),
            CgdBeta::DaiYuanCd => terms.dy().min(terms.cd()).max(F::zero()),
            CgdBeta::DaiYuanHs => terms.dy().min(terms.hs()).max(F::zero()),
        }
    }
}

impl fmt::Display for CgdBeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CgdBeta {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        CgdBeta::ALL
            .into_iter()
            .find(|b| b.name() == lower)
            .ok_or_else(|| ConfigError::UnknownName {
                kind: "conjugate-gradient update",
                name: s.to_string(),
            })
    }
}

/// Inner products shared by the formulas.
struct Terms<F> {
    gg: F,
    gpgp: F,
    gy: F,
    dy: F,
    dgp: F,
    yy: F,
    gd: F,
}

impl<F: Float> Terms<F> {
    fn new(g_prev: &[F], d_prev: &[F], g: &[F]) -> Self {
        let y: Vec<F> = g.iter().zip(g_prev).map(|(&a, &b)| a - b).collect();
        Terms {
            gg: dot(g, g),
            gpgp: dot(g_prev, g_prev),
            gy: dot(g, &y),
            dy: dot(d_prev, &y),
            dgp: dot(d_prev, g_prev),
            yy: dot(&y, &y),
            gd: dot(g, d_prev),
        }
    }

    fn hs(&self) -> F {
        self.gy / self.dy
    }

    fn fr(&self) -> F {
        self.gg / self.gpgp
    }

    fn prp(&self) -> F {
        self.gy / self.gpgp
    }

    fn cd(&self) -> F {
        -self.gg / self.dgp
    }

    fn ls(&self) -> F {
        -self.gy / self.dgp
    }

    fn dy(&self) -> F {
        self.gg / self.dy
    }

    /// `(y - 2·d'·|y|²/(d'·y))·g / (d'·y)`, bounded below.
    fn hz(&self, d_norm: F, gp_norm: F) -> F {
        let two = F::one() + F::one();
        let beta = (self.gy - two * self.yy / self.dy * self.gd) / self.dy;
        let eta = cst(0.01, F::epsilon().sqrt());
        let bound = -F::one() / (d_norm * eta.min(gp_norm));
        beta.max(bound)
    }
}
