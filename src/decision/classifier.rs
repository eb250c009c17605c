//! Pick classification by signal source and strength

use serde::Serialize;
use std::fmt;

pub use crate::decision::math::kelly_criterion;

pub const EV_THRESHOLD_LOW: f64 = 0.03;
pub const EV_THRESHOLD_MEDIUM: f64 = 0.05;
pub const EV_THRESHOLD_HIGH: f64 = 0.08;
pub const Z_THRESHOLD_LOW: f64 = 2.0;
pub const Z_THRESHOLD_HIGH: f64 = 3.0;
pub const ERROR_CONFIDENCE_MIN: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PickType {
    /// Model EV only
    Model,
    /// Price far from the market only
    Anomaly,
    /// Model EV and market anomaly together
    Hybrid,
    Arbitrage,
    /// Probable mispriced line
    Error,
}

impl PickType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickType::Model => "MODEL",
            PickType::Anomaly => "ANOMALY",
            PickType::Hybrid => "HYBRID",
            PickType::Arbitrage => "ARBITRAGE",
            PickType::Error => "ERROR",
        }
    }
}

impl fmt::Display for PickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PickPriority {
    Skip = 0,
    Minimal = 1,
    Low = 2,
    Medium = 3,
    High = 4,
    Critical = 5,
}

impl PickPriority {
    pub fn flames(&self) -> &'static str {
        match self {
            PickPriority::Critical => "🔥🔥🔥🔥🔥",
            PickPriority::High => "🔥🔥🔥🔥",
            PickPriority::Medium => "🔥🔥🔥",
            PickPriority::Low => "🔥🔥",
            PickPriority::Minimal => "🔥",
            PickPriority::Skip => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickAction {
    BetNow,
    BetSoon,
    Monitor,
    Skip,
}

impl PickAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickAction::BetNow => "BET_NOW",
            PickAction::BetSoon => "BET_SOON",
            PickAction::Monitor => "MONITOR",
            PickAction::Skip => "SKIP",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            PickAction::BetNow => "🚀",
            PickAction::BetSoon => "✅",
            PickAction::Monitor => "👀",
            PickAction::Skip => "❌",
        }
    }

    /// Actions that should produce an alert
    pub fn is_bet(&self) -> bool {
        matches!(self, PickAction::BetNow | PickAction::BetSoon)
    }
}

/// Evidence gathered for one pick
#[derive(Debug, Clone, Default)]
pub struct PickSignals {
    pub ev: Option<f64>,
    pub z_score: Option<f64>,
    pub quality_score: f64,
    pub is_arbitrage: bool,
    pub is_error: bool,
    pub error_confidence: f64,
    pub model_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// None when the pick does not qualify
    pub pick_type: Option<PickType>,
    pub priority: PickPriority,
    pub confidence: f64,
    pub description: String,
    pub action: PickAction,
    pub kelly_fraction: f64,
    pub reasoning: Vec<String>,
    pub emoji: &'static str,
}

impl Classification {
    pub fn type_label(&self) -> &'static str {
        self.pick_type.map(|t| t.as_str()).unwrap_or("NONE")
    }
}

pub fn classify_pick(signals: &PickSignals) -> Classification {
    let mut reasoning = Vec::new();

    if signals.is_error && signals.error_confidence > ERROR_CONFIDENCE_MIN {
        reasoning.push(format!(
            "Error de cuota detectado (confianza: {:.0}%)",
            signals.error_confidence * 100.0
        ));
        reasoning.push("Actuar INMEDIATAMENTE antes de corrección".to_string());
        return Classification {
            pick_type: Some(PickType::Error),
            priority: PickPriority::Critical,
            confidence: signals.error_confidence,
            description: "⚠️ ERROR DE CUOTA - Actuar inmediatamente".to_string(),
            action: PickAction::BetNow,
            kelly_fraction: 0.5,
            reasoning,
            emoji: "🚨",
        };
    }

    if signals.is_arbitrage {
        reasoning.push("Oportunidad de arbitraje sin riesgo".to_string());
        reasoning.push("Ganancia garantizada independiente del resultado".to_string());
        return Classification {
            pick_type: Some(PickType::Arbitrage),
            priority: PickPriority::Critical,
            confidence: 1.0,
            description: "💎 ARBITRAJE - Sin riesgo".to_string(),
            action: PickAction::BetNow,
            kelly_fraction: 1.0,
            reasoning,
            emoji: "💎",
        };
    }

    let ev = signals.ev.filter(|ev| *ev > EV_THRESHOLD_LOW);
    let z = signals
        .z_score
        .map(f64::abs)
        .filter(|z| *z > Z_THRESHOLD_LOW);
    let quality = signals.quality_score;

    match (ev, z) {
        (Some(ev), Some(z)) => {
            reasoning.push(format!("EV+{:.1}% según modelo estadístico", ev * 100.0));
            reasoning.push(format!("Anomalía detectada (Z-score: {:.2})", z));
            reasoning.push("Doble confirmación: modelo + mercado".to_string());

            let ev_conf = (ev / EV_THRESHOLD_HIGH).min(1.0);
            let z_conf = (z / Z_THRESHOLD_HIGH).min(1.0);

            let (priority, action, kelly) = if ev > EV_THRESHOLD_HIGH && z > Z_THRESHOLD_HIGH {
                (PickPriority::Critical, PickAction::BetNow, 0.4)
            } else {
                (PickPriority::High, PickAction::BetSoon, 0.25)
            };

            Classification {
                pick_type: Some(PickType::Hybrid),
                priority,
                confidence: (ev_conf + z_conf) / 2.0 * quality,
                description: format!("⭐ HYBRID - EV+{:.1}% + Z={:.2}", ev * 100.0, z),
                action,
                kelly_fraction: kelly,
                reasoning,
                emoji: "⭐",
            }
        }
        (Some(ev), None) => {
            reasoning.push(format!("EV+{:.1}% según modelo estadístico", ev * 100.0));
            if signals.model_confidence > 0.0 {
                reasoning.push(format!(
                    "Confianza del modelo: {:.0}%",
                    signals.model_confidence * 100.0
                ));
            }

            let (priority, action, kelly, band) = if ev > EV_THRESHOLD_HIGH {
                (PickPriority::Medium, PickAction::BetSoon, 0.20, "Alto")
            } else if ev > EV_THRESHOLD_MEDIUM {
                (PickPriority::Medium, PickAction::BetSoon, 0.15, "Medio")
            } else {
                (PickPriority::Minimal, PickAction::Monitor, 0.10, "Bajo")
            };

            Classification {
                pick_type: Some(PickType::Model),
                priority,
                confidence: (ev / EV_THRESHOLD_HIGH).min(1.0) * quality,
                description: format!("💰 MODEL - EV+{:.1}% ({})", ev * 100.0, band),
                action,
                kelly_fraction: kelly,
                reasoning,
                emoji: "💰",
            }
        }
        (None, Some(z)) => {
            reasoning.push(format!("Anomalía detectada (Z-score: {:.2})", z));
            reasoning.push("Odd significativamente diferente del mercado".to_string());

            let (priority, action, kelly, description) = if z > Z_THRESHOLD_HIGH {
                (
                    PickPriority::Medium,
                    PickAction::BetSoon,
                    0.15,
                    format!("📊 ANOMALY - Z={:.2} (Alto)", z),
                )
            } else {
                (
                    PickPriority::Low,
                    PickAction::Monitor,
                    0.10,
                    format!("📊 ANOMALY - Z={:.2}", z),
                )
            };

            Classification {
                pick_type: Some(PickType::Anomaly),
                priority,
                confidence: (z / Z_THRESHOLD_HIGH).min(1.0) * quality,
                description,
                action,
                kelly_fraction: kelly,
                reasoning,
                emoji: "📊",
            }
        }
        (None, None) => {
            reasoning.push("No cumple criterios mínimos".to_string());
            reasoning.push(match signals.ev {
                Some(ev) if ev != 0.0 => format!(
                    "EV: {:.1}% (mín: {:.1}%)",
                    ev * 100.0,
                    EV_THRESHOLD_LOW * 100.0
                ),
                _ => "Sin EV".to_string(),
            });
            reasoning.push(match signals.z_score {
                Some(z) if z != 0.0 => {
                    format!("Z-score: {:.2} (mín: {:.1})", z.abs(), Z_THRESHOLD_LOW)
                }
                _ => "Sin anomalía".to_string(),
            });

            Classification {
                pick_type: None,
                priority: PickPriority::Skip,
                confidence: 0.0,
                description: "❌ NO CALIFICA".to_string(),
                action: PickAction::Skip,
                kelly_fraction: 0.0,
                reasoning,
                emoji: "❌",
            }
        }
    }
}

pub fn format_classification(c: &Classification) -> String {
    if c.pick_type.is_none() {
        return "❌ Pick no califica".to_string();
    }

    let mut lines = vec![
        format!("{} {}", c.emoji, c.description),
        format!("Prioridad: {}", c.priority.flames()),
        format!("Confianza: {:.0}%", c.confidence * 100.0),
        format!("Acción: {} {}", c.action.emoji(), c.action.as_str()),
        format!("Kelly: {:.0}%", c.kelly_fraction * 100.0),
    ];

    if !c.reasoning.is_empty() {
        lines.push("\nRazonamiento:".to_string());
        lines.extend(c.reasoning.iter().map(|r| format!("  • {}", r)));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hybrid() {
        let c = classify_pick(&PickSignals {
            ev: Some(0.085),
            z_score: Some(-3.2),
            quality_score: 0.85,
            ..Default::default()
        });
        assert_eq!(c.pick_type, Some(PickType::Hybrid));
        assert_eq!(c.priority, PickPriority::Critical);
        assert_eq!(c.action, PickAction::BetNow);
        assert!((c.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_model_bands() {
        let medium = classify_pick(&PickSignals {
            ev: Some(0.06),
            quality_score: 0.75,
            ..Default::default()
        });
        assert_eq!(medium.pick_type, Some(PickType::Model));
        assert_eq!(medium.action, PickAction::BetSoon);
        assert!((medium.kelly_fraction - 0.15).abs() < 1e-9);
        assert!(medium.description.contains("Medio"));

        let low = classify_pick(&PickSignals {
            ev: Some(0.04),
            quality_score: 0.75,
            model_confidence: 0.75,
            ..Default::default()
        });
        assert_eq!(low.action, PickAction::Monitor);
        assert_eq!(low.reasoning.len(), 2);
    }

    #[test]
    fn test_anomaly_and_skip() {
        let anomaly = classify_pick(&PickSignals {
            z_score: Some(2.8),
            quality_score: 0.7,
            ..Default::default()
        });
        assert_eq!(anomaly.pick_type, Some(PickType::Anomaly));
        assert_eq!(anomaly.priority, PickPriority::Low);

        let skip = classify_pick(&PickSignals {
            ev: Some(0.02),
            z_score: Some(1.5),
            quality_score: 0.6,
            ..Default::default()
        });
        assert_eq!(skip.pick_type, None);
        assert_eq!(skip.action, PickAction::Skip);
        assert!(skip.reasoning[1].starts_with("EV: 2.0%"));
        assert_eq!(format_classification(&skip), "❌ Pick no califica");
    }

    #[test]
    fn test_error_and_arbitrage_first() {
        let err = classify_pick(&PickSignals {
            ev: Some(0.2),
            is_error: true,
            error_confidence: 0.9,
            ..Default::default()
        });
        assert_eq!(err.pick_type, Some(PickType::Error));

        let weak_error = classify_pick(&PickSignals {
            is_error: true,
            error_confidence: 0.6,
            is_arbitrage: true,
            ..Default::default()
        });
        assert_eq!(weak_error.pick_type, Some(PickType::Arbitrage));
        assert!(format_classification(&weak_error).contains("Kelly: 100%"));
    }

    #[test]
    fn test_kelly() {
        assert!((kelly_criterion(0.55, 2.0, 0.25) - 0.025).abs() < 1e-9);
        assert_eq!(kelly_criterion(0.4, 2.0, 0.25), 0.0);
    }
}
