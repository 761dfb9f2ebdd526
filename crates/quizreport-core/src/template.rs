//! Per-quiz report template.
//!
//! A template is a typed configuration tree: eight rendered sections, four
//! settings blocks and one [`PacketConfig`] per packet. Every block carries
//! `enabled` and `order`. Rendering sorts enabled sections by ascending
//! `order`; moving a section swaps its `order` with its displayed neighbour.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TemplateError;
use crate::model::Packet;

/// Number of explicit saves kept in [`TemplateHistory`].
pub const HISTORY_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Block identifiers
// ---------------------------------------------------------------------------

/// Every top-level block of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionId {
    Header,
    UserInfo,
    OverallScore,
    Charts,
    SectionAnalysis,
    PerformanceInsights,
    Recommendations,
    Footer,
    Page,
    Typography,
    Colors,
    Packets,
}

impl SectionId {
    pub const ALL: [SectionId; 12] = [
        SectionId::Header,
        SectionId::UserInfo,
        SectionId::OverallScore,
        SectionId::Charts,
        SectionId::SectionAnalysis,
        SectionId::PerformanceInsights,
        SectionId::Recommendations,
        SectionId::Footer,
        SectionId::Page,
        SectionId::Typography,
        SectionId::Colors,
        SectionId::Packets,
    ];

    /// Sections drawn as part of the report, in canonical order.
    pub const RENDERED: [SectionId; 8] = [
        SectionId::Header,
        SectionId::UserInfo,
        SectionId::OverallScore,
        SectionId::Charts,
        SectionId::SectionAnalysis,
        SectionId::PerformanceInsights,
        SectionId::Recommendations,
        SectionId::Footer,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SectionId::Header => "header",
            SectionId::UserInfo => "userInfo",
            SectionId::OverallScore => "overallScore",
            SectionId::Charts => "charts",
            SectionId::SectionAnalysis => "sectionAnalysis",
            SectionId::PerformanceInsights => "performanceInsights",
            SectionId::Recommendations => "recommendations",
            SectionId::Footer => "footer",
            SectionId::Page => "page",
            SectionId::Typography => "typography",
            SectionId::Colors => "colors",
            SectionId::Packets => "packets",
        }
    }

    pub fn is_rendered(self) -> bool {
        SectionId::RENDERED.contains(&self)
    }

    /// Position in the default layout; header sits at 0, footer at 7.
    fn default_order(self) -> i64 {
        SectionId::RENDERED
            .iter()
            .position(|s| *s == self)
            .map(|i| i as i64)
            .unwrap_or(0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SectionId {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .iter()
            .copied()
            .find(|id| id.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| TemplateError::UnknownField(s.to_string()))
    }
}

/// Direction of a reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(TemplateError::InvalidValue {
                field: "direction".into(),
                value: other.into(),
                reason: "expected up or down".into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared style block
// ---------------------------------------------------------------------------

/// Box styling shared by rendered sections, expressed as CSS values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxStyle {
    pub background_color: String,
    pub border_color: String,
    pub font_size: String,
    pub font_weight: String,
    pub text_align: String,
    pub padding: String,
    pub margin: String,
    pub border_radius: String,
    pub border_width: String,
    pub shadow: String,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".into(),
            border_color: "#e5e7eb".into(),
            font_size: "14px".into(),
            font_weight: "normal".into(),
            text_align: "left".into(),
            padding: "20px".into(),
            margin: "16px 0px".into(),
            border_radius: "8px".into(),
            border_width: "1px".into(),
            shadow: "0 2px 4px rgba(0, 0, 0, 0.05)".into(),
        }
    }
}

impl BoxStyle {
    fn with(background: &str, border: &str, font_size: &str, weight: &str, align: &str) -> Self {
        Self {
            background_color: background.into(),
            border_color: border.into(),
            font_size: font_size.into(),
            font_weight: weight.into(),
            text_align: align.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderSection {
    pub enabled: bool,
    pub order: i64,
    pub text_color: String,
    pub title: String,
    pub subtitle: String,
    pub show_logo: bool,
    pub logo_position: String,
    #[serde(flatten)]
    pub style: BoxStyle,
}

impl Default for HeaderSection {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 0,
            text_color: "#ffffff".into(),
            title: "Assessment Report".into(),
            subtitle: "Performance Analysis".into(),
            show_logo: true,
            logo_position: "left".into(),
            style: BoxStyle {
                background_color: "#2563eb".into(),
                border_color: "transparent".into(),
                font_size: "24px".into(),
                font_weight: "bold".into(),
                text_align: "center".into(),
                margin: "0px".into(),
                border_width: "0px".into(),
                shadow: "0 4px 6px rgba(0, 0, 0, 0.1)".into(),
                ..BoxStyle::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfoSection {
    pub enabled: bool,
    pub order: i64,
    pub show_avatar: bool,
    pub show_email: bool,
    pub show_profile: bool,
    pub show_date: bool,
    #[serde(flatten)]
    pub style: BoxStyle,
}

impl Default for UserInfoSection {
    fn default() -> Self {
        Self {
            enabled: true,
            order: SectionId::UserInfo.default_order(),
            show_avatar: true,
            show_email: true,
            show_profile: true,
            show_date: true,
            style: BoxStyle {
                padding: "16px".into(),
                border_width: "2px".into(),
                ..BoxStyle::with("#f8fafc", "#e5e7eb", "14px", "normal", "left")
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverallScoreSection {
    pub enabled: bool,
    pub order: i64,
    pub show_percentage: bool,
    pub show_grade: bool,
    pub show_level: bool,
    pub show_trend: bool,
    #[serde(flatten)]
    pub style: BoxStyle,
}

impl Default for OverallScoreSection {
    fn default() -> Self {
        Self {
            enabled: true,
            order: SectionId::OverallScore.default_order(),
            show_percentage: true,
            show_grade: true,
            show_level: true,
            show_trend: true,
            style: BoxStyle {
                border_radius: "12px".into(),
                border_width: "2px".into(),
                shadow: "0 4px 8px rgba(0, 0, 0, 0.1)".into(),
                ..BoxStyle::with("#f8fafc", "#e5e7eb", "18px", "bold", "center")
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartsSection {
    pub enabled: bool,
    pub order: i64,
    pub layout: String,
    pub grid_columns: u32,
    pub show_bar_chart: bool,
    pub show_pie_chart: bool,
    pub show_gauge_chart: bool,
    pub show_radar_chart: bool,
    pub chart_height: String,
    pub chart_width: String,
    #[serde(flatten)]
    pub style: BoxStyle,
}

impl Default for ChartsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            order: SectionId::Charts.default_order(),
            layout: "grid".into(),
            grid_columns: 2,
            show_bar_chart: true,
            show_pie_chart: true,
            show_gauge_chart: true,
            show_radar_chart: true,
            chart_height: "300px".into(),
            chart_width: "100%".into(),
            style: BoxStyle::with("#ffffff", "#e5e7eb", "14px", "normal", "center"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionAnalysisSection {
    pub enabled: bool,
    pub order: i64,
    pub show_packet_scores: bool,
    pub show_question_breakdown: bool,
    pub show_time_analysis: bool,
    pub show_difficulty_levels: bool,
    #[serde(flatten)]
    pub style: BoxStyle,
}

impl Default for SectionAnalysisSection {
    fn default() -> Self {
        Self {
            enabled: true,
            order: SectionId::SectionAnalysis.default_order(),
            show_packet_scores: true,
            show_question_breakdown: true,
            show_time_analysis: true,
            show_difficulty_levels: true,
            style: BoxStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsightsSection {
    pub enabled: bool,
    pub order: i64,
    pub show_strengths: bool,
    pub show_weaknesses: bool,
    pub show_improvements: bool,
    pub show_comparisons: bool,
    #[serde(flatten)]
    pub style: BoxStyle,
}

impl Default for InsightsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            order: SectionId::PerformanceInsights.default_order(),
            show_strengths: true,
            show_weaknesses: true,
            show_improvements: true,
            show_comparisons: true,
            style: BoxStyle {
                border_width: "2px".into(),
                ..BoxStyle::with("#f0f9ff", "#0ea5e9", "14px", "medium", "left")
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationsSection {
    pub enabled: bool,
    pub order: i64,
    pub show_action_items: bool,
    pub show_resources: bool,
    pub show_timeline: bool,
    pub show_priority: bool,
    #[serde(flatten)]
    pub style: BoxStyle,
}

impl Default for RecommendationsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            order: SectionId::Recommendations.default_order(),
            show_action_items: true,
            show_resources: true,
            show_timeline: true,
            show_priority: true,
            style: BoxStyle {
                border_width: "2px".into(),
                ..BoxStyle::with("#fef3c7", "#f59e0b", "14px", "medium", "left")
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterSection {
    pub enabled: bool,
    pub order: i64,
    pub show_timestamp: bool,
    pub show_page_numbers: bool,
    pub show_company_info: bool,
    pub show_contact_info: bool,
    #[serde(flatten)]
    pub style: BoxStyle,
}

impl Default for FooterSection {
    fn default() -> Self {
        Self {
            enabled: true,
            order: SectionId::Footer.default_order(),
            show_timestamp: true,
            show_page_numbers: true,
            show_company_info: true,
            show_contact_info: true,
            style: BoxStyle {
                padding: "16px".into(),
                ..BoxStyle::with("#f8fafc", "#e5e7eb", "12px", "normal", "center")
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Settings blocks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    Letter,
    Legal,
    Tabloid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSettings {
    pub enabled: bool,
    pub order: i64,
    pub size: PageSize,
    pub orientation: Orientation,
    pub background_color: String,
    /// CSS length, e.g. `20mm`.
    pub margin: String,
    pub show_page_numbers: bool,
    pub show_watermark: bool,
    pub watermark_text: String,
    pub watermark_opacity: String,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 0,
            size: PageSize::A4,
            orientation: Orientation::Portrait,
            background_color: "#ffffff".into(),
            margin: "20mm".into(),
            show_page_numbers: true,
            show_watermark: false,
            watermark_text: "Assessment Report".into(),
            watermark_opacity: "0.1".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    pub enabled: bool,
    pub order: i64,
    pub primary_font: String,
    pub secondary_font: String,
    pub heading_font_size: String,
    pub subheading_font_size: String,
    pub body_font_size: String,
    pub caption_font_size: String,
    pub line_height: String,
    pub letter_spacing: String,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 0,
            primary_font: "Helvetica".into(),
            secondary_font: "Arial".into(),
            heading_font_size: "24px".into(),
            subheading_font_size: "18px".into(),
            body_font_size: "14px".into(),
            caption_font_size: "12px".into(),
            line_height: "1.5".into(),
            letter_spacing: "0.5px".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorPalette {
    pub enabled: bool,
    pub order: i64,
    pub primary: String,
    pub secondary: String,
    pub success: String,
    pub warning: String,
    pub danger: String,
    pub info: String,
    pub light: String,
    pub dark: String,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 0,
            primary: "#2563eb".into(),
            secondary: "#6b7280".into(),
            success: "#10b981".into(),
            warning: "#f59e0b".into(),
            danger: "#ef4444".into(),
            info: "#06b6d4".into(),
            light: "#f8fafc".into(),
            dark: "#1f2937".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PacketsSettings {
    pub enabled: bool,
    pub order: i64,
    pub show_individual_scores: bool,
    pub show_question_details: bool,
    pub show_time_spent: bool,
    pub show_difficulty_analysis: bool,
    pub show_performance_trends: bool,
    pub show_comparative_analysis: bool,
    pub alternate_row_colors: bool,
    pub row_background_color: String,
    pub row_alternate_background_color: String,
    #[serde(flatten)]
    pub style: BoxStyle,
}

impl Default for PacketsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 0,
            show_individual_scores: true,
            show_question_details: true,
            show_time_spent: true,
            show_difficulty_analysis: true,
            show_performance_trends: true,
            show_comparative_analysis: true,
            alternate_row_colors: true,
            row_background_color: "#f8fafc".into(),
            row_alternate_background_color: "#ffffff".into(),
            style: BoxStyle {
                padding: "16px".into(),
                margin: "8px 0px".into(),
                border_radius: "6px".into(),
                shadow: "0 1px 3px rgba(0, 0, 0, 0.05)".into(),
                ..BoxStyle::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Per-packet configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Pie,
    Gauge,
    Radar,
}

/// How large a level image is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDisplayStyle {
    #[default]
    Icon,
    Medium,
    Large,
    Banner,
}

/// Where a level's descriptive text sits relative to the level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDisplayPosition {
    Above,
    #[default]
    Below,
    Inline,
    Separate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelIndicatorStyle {
    #[default]
    Badge,
    Highlight,
    Border,
    Background,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleProgressStyle {
    #[default]
    None,
    Linear,
    Circular,
    Dots,
    Steps,
}

/// Display rules for one packet's card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PacketConfig {
    pub enabled: bool,
    pub order: i64,
    pub title: String,
    pub description: String,
    pub show_header: bool,
    pub show_score_breakdown: bool,
    pub show_question_list: bool,
    pub show_performance_level: bool,
    pub show_recommendations: bool,
    pub header_background_color: String,
    pub header_text_color: String,
    pub score_color: String,
    pub chart_type: ChartType,
    pub chart_colors: Vec<String>,
    pub custom_icon: String,
    pub custom_label: String,
    pub show_scaling_level: bool,
    pub show_scaling_label: bool,
    pub show_scaling_image: bool,
    pub show_scaling_text: bool,
    pub show_scaling_colors: bool,
    pub show_scaling_range: bool,
    pub image_display_style: ImageDisplayStyle,
    pub text_display_position: TextDisplayPosition,
    pub level_indicator_style: LevelIndicatorStyle,
    pub scale_progress_style: ScaleProgressStyle,
    pub show_all_scale_levels: bool,
    pub highlight_current_level: bool,
    pub show_scale_comparison: bool,
    pub show_improvement_suggestions: bool,
    #[serde(flatten)]
    pub style: BoxStyle,
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 1,
            title: String::new(),
            description: String::new(),
            show_header: true,
            show_score_breakdown: true,
            show_question_list: true,
            show_performance_level: true,
            show_recommendations: true,
            header_background_color: "#f8fafc".into(),
            header_text_color: "#374151".into(),
            score_color: "#10b981".into(),
            chart_type: ChartType::Bar,
            chart_colors: vec![
                "#3b82f6".into(),
                "#10b981".into(),
                "#f59e0b".into(),
                "#ef4444".into(),
            ],
            custom_icon: String::new(),
            custom_label: String::new(),
            show_scaling_level: true,
            show_scaling_label: true,
            show_scaling_image: true,
            show_scaling_text: true,
            show_scaling_colors: true,
            show_scaling_range: false,
            image_display_style: ImageDisplayStyle::Icon,
            text_display_position: TextDisplayPosition::Below,
            level_indicator_style: LevelIndicatorStyle::Badge,
            scale_progress_style: ScaleProgressStyle::None,
            show_all_scale_levels: false,
            highlight_current_level: true,
            show_scale_comparison: false,
            show_improvement_suggestions: true,
            style: BoxStyle {
                shadow: "0 2px 4px rgba(0, 0, 0, 0.1)".into(),
                ..BoxStyle::default()
            },
        }
    }
}

impl PacketConfig {
    /// Default configuration for the packet at position `index` of its quiz.
    pub fn for_packet(packet: &Packet, index: usize) -> Self {
        Self {
            order: index as i64 + 1,
            title: packet.name.clone(),
            description: packet.description.clone(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// The full per-quiz document configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportTemplate {
    pub header: HeaderSection,
    pub user_info: UserInfoSection,
    pub overall_score: OverallScoreSection,
    pub charts: ChartsSection,
    pub section_analysis: SectionAnalysisSection,
    pub performance_insights: InsightsSection,
    pub recommendations: RecommendationsSection,
    pub footer: FooterSection,
    pub page: PageSettings,
    pub typography: Typography,
    pub colors: ColorPalette,
    pub packets: PacketsSettings,
    /// Keyed by packet id. Entries are added once and never removed.
    pub packet_configs: BTreeMap<String, PacketConfig>,
}

impl ReportTemplate {
    /// `(enabled, order)` of a block.
    pub fn placement(&self, id: SectionId) -> (bool, i64) {
        match id {
            SectionId::Header => (self.header.enabled, self.header.order),
            SectionId::UserInfo => (self.user_info.enabled, self.user_info.order),
            SectionId::OverallScore => (self.overall_score.enabled, self.overall_score.order),
            SectionId::Charts => (self.charts.enabled, self.charts.order),
            SectionId::SectionAnalysis => {
                (self.section_analysis.enabled, self.section_analysis.order)
            }
            SectionId::PerformanceInsights => (
                self.performance_insights.enabled,
                self.performance_insights.order,
            ),
            SectionId::Recommendations => (self.recommendations.enabled, self.recommendations.order),
            SectionId::Footer => (self.footer.enabled, self.footer.order),
            SectionId::Page => (self.page.enabled, self.page.order),
            SectionId::Typography => (self.typography.enabled, self.typography.order),
            SectionId::Colors => (self.colors.enabled, self.colors.order),
            SectionId::Packets => (self.packets.enabled, self.packets.order),
        }
    }

    pub(crate) fn placement_mut(&mut self, id: SectionId) -> (&mut bool, &mut i64) {
        match id {
            SectionId::Header => (&mut self.header.enabled, &mut self.header.order),
            SectionId::UserInfo => (&mut self.user_info.enabled, &mut self.user_info.order),
            SectionId::OverallScore => {
                (&mut self.overall_score.enabled, &mut self.overall_score.order)
            }
            SectionId::Charts => (&mut self.charts.enabled, &mut self.charts.order),
            SectionId::SectionAnalysis => (
                &mut self.section_analysis.enabled,
                &mut self.section_analysis.order,
            ),
            SectionId::PerformanceInsights => (
                &mut self.performance_insights.enabled,
                &mut self.performance_insights.order,
            ),
            SectionId::Recommendations => (
                &mut self.recommendations.enabled,
                &mut self.recommendations.order,
            ),
            SectionId::Footer => (&mut self.footer.enabled, &mut self.footer.order),
            SectionId::Page => (&mut self.page.enabled, &mut self.page.order),
            SectionId::Typography => (&mut self.typography.enabled, &mut self.typography.order),
            SectionId::Colors => (&mut self.colors.enabled, &mut self.colors.order),
            SectionId::Packets => (&mut self.packets.enabled, &mut self.packets.order),
        }
    }

    /// Box style of a block, `None` for blocks without one.
    pub fn style(&self, id: SectionId) -> Option<&BoxStyle> {
        match id {
            SectionId::Header => Some(&self.header.style),
            SectionId::UserInfo => Some(&self.user_info.style),
            SectionId::OverallScore => Some(&self.overall_score.style),
            SectionId::Charts => Some(&self.charts.style),
            SectionId::SectionAnalysis => Some(&self.section_analysis.style),
            SectionId::PerformanceInsights => Some(&self.performance_insights.style),
            SectionId::Recommendations => Some(&self.recommendations.style),
            SectionId::Footer => Some(&self.footer.style),
            SectionId::Packets => Some(&self.packets.style),
            SectionId::Page | SectionId::Typography | SectionId::Colors => None,
        }
    }

    pub(crate) fn style_mut(&mut self, id: SectionId) -> Option<&mut BoxStyle> {
        match id {
            SectionId::Header => Some(&mut self.header.style),
            SectionId::UserInfo => Some(&mut self.user_info.style),
            SectionId::OverallScore => Some(&mut self.overall_score.style),
            SectionId::Charts => Some(&mut self.charts.style),
            SectionId::SectionAnalysis => Some(&mut self.section_analysis.style),
            SectionId::PerformanceInsights => Some(&mut self.performance_insights.style),
            SectionId::Recommendations => Some(&mut self.recommendations.style),
            SectionId::Footer => Some(&mut self.footer.style),
            SectionId::Packets => Some(&mut self.packets.style),
            SectionId::Page | SectionId::Typography | SectionId::Colors => None,
        }
    }

    /// Enabled rendered sections sorted by ascending `order`.
    ///
    /// The sort is stable, so sections sharing an `order` keep canonical order.
    pub fn ordered_sections(&self) -> Vec<SectionId> {
        let mut sections: Vec<SectionId> = SectionId::RENDERED
            .iter()
            .copied()
            .filter(|id| self.placement(*id).0)
            .collect();
        sections.sort_by_key(|id| self.placement(*id).1);
        sections
    }

    /// Swap a section's `order` with its neighbour in display order.
    ///
    /// Returns `false` when the section is disabled, not rendered, or already
    /// at the end it is moving towards.
    pub fn move_section(&mut self, id: SectionId, direction: Direction) -> bool {
        let sections = self.ordered_sections();
        let Some(current) = sections.iter().position(|s| *s == id) else {
            return false;
        };
        let neighbour = match direction {
            Direction::Up if current > 0 => sections[current - 1],
            Direction::Down if current + 1 < sections.len() => sections[current + 1],
            _ => return false,
        };
        let a = self.placement(id).1;
        let b = self.placement(neighbour).1;
        *self.placement_mut(id).1 = b;
        *self.placement_mut(neighbour).1 = a;
        true
    }

    pub fn toggle_section(&mut self, id: SectionId) -> bool {
        let (enabled, _) = self.placement_mut(id);
        *enabled = !*enabled;
        *enabled
    }

    /// Restore default ordering and re-enable every rendered section.
    pub fn reset_section_order(&mut self) {
        for id in SectionId::RENDERED {
            let (enabled, order) = self.placement_mut(id);
            *enabled = true;
            *order = id.default_order();
        }
    }

    /// Add a default config for every packet that lacks one. Returns how many
    /// were added. Existing configs, including ones for packets no longer in
    /// the quiz, are left alone.
    pub fn sync_packets(&mut self, packets: &[Packet]) -> usize {
        let mut added = 0;
        for (index, packet) in packets.iter().enumerate() {
            if !self.packet_configs.contains_key(&packet.id) {
                self.packet_configs
                    .insert(packet.id.clone(), PacketConfig::for_packet(packet, index));
                added += 1;
            }
        }
        added
    }

    /// Packets with a config, sorted by config `order`, enabled or not.
    fn sorted_configured<'a>(&self, packets: &'a [Packet]) -> Vec<&'a Packet> {
        let mut sorted: Vec<&Packet> = packets
            .iter()
            .filter(|p| self.packet_configs.contains_key(&p.id))
            .collect();
        sorted.sort_by_key(|p| self.packet_configs[&p.id].order);
        sorted
    }

    /// Swap a packet's `order` with its neighbour among configured packets.
    pub fn move_packet(&mut self, packet_id: &str, direction: Direction, packets: &[Packet]) -> bool {
        let sorted = self.sorted_configured(packets);
        let Some(current) = sorted.iter().position(|p| p.id == packet_id) else {
            return false;
        };
        let neighbour = match direction {
            Direction::Up if current > 0 => sorted[current - 1].id.clone(),
            Direction::Down if current + 1 < sorted.len() => sorted[current + 1].id.clone(),
            _ => return false,
        };
        let a = self.packet_configs[packet_id].order;
        let b = self.packet_configs[&neighbour].order;
        if let Some(cfg) = self.packet_configs.get_mut(packet_id) {
            cfg.order = b;
        }
        if let Some(cfg) = self.packet_configs.get_mut(&neighbour) {
            cfg.order = a;
        }
        true
    }

    pub fn toggle_packet(&mut self, packet_id: &str) -> Result<bool, TemplateError> {
        let cfg = self
            .packet_configs
            .get_mut(packet_id)
            .ok_or_else(|| TemplateError::UnknownPacket(packet_id.to_string()))?;
        cfg.enabled = !cfg.enabled;
        Ok(cfg.enabled)
    }

    /// Restore quiz order and re-enable every configured packet.
    pub fn reset_packet_order(&mut self, packets: &[Packet]) {
        for (index, packet) in packets.iter().enumerate() {
            if let Some(cfg) = self.packet_configs.get_mut(&packet.id) {
                cfg.order = index as i64 + 1;
                cfg.enabled = true;
            }
        }
    }

    /// Enabled packets in display order, with their configs.
    pub fn configured_packets<'a>(&'a self, packets: &'a [Packet]) -> Vec<(&'a Packet, &'a PacketConfig)> {
        self.sorted_configured(packets)
            .into_iter()
            .filter_map(|p| {
                let cfg = &self.packet_configs[&p.id];
                cfg.enabled.then_some((p, cfg))
            })
            .collect()
    }

    /// Non-blocking checks on user-entered values.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.header.title.trim().is_empty() {
            issues.push("Header title is required".to_string());
        }
        if !is_hex_color(&self.header.style.background_color) {
            issues.push("Header background color must be a valid hex color".to_string());
        }
        if !is_pixel_size(&self.typography.heading_font_size) {
            issues.push("Heading font size must be in pixels (e.g., 24px)".to_string());
        }
        if leading_int(&self.page.margin).is_some_and(|m| m > 50) {
            issues.push("Page margin seems too large (max 50mm recommended)".to_string());
        }
        issues
    }

    /// Restyle header, palette and fonts from a named preset.
    pub fn apply_preset(&mut self, preset: Preset) {
        let (header_bg, header_text, primary, secondary, font1, font2) = match preset {
            Preset::Professional => ("#1e40af", "#ffffff", "#1e40af", "#475569", "Helvetica", "Arial"),
            Preset::Creative => ("#7c3aed", "#ffffff", "#7c3aed", "#ec4899", "Georgia", "Verdana"),
            Preset::Minimal => ("#f8fafc", "#1f2937", "#6b7280", "#9ca3af", "Inter", "System"),
            Preset::Academic => (
                "#059669",
                "#ffffff",
                "#059669",
                "#047857",
                "Times New Roman",
                "Georgia",
            ),
        };
        self.header.style.background_color = header_bg.into();
        self.header.text_color = header_text.into();
        self.colors.primary = primary.into();
        self.colors.secondary = secondary.into();
        self.typography.primary_font = font1.into();
        self.typography.secondary_font = font2.into();
    }
}

/// `#RRGGBB`, case-insensitive.
pub fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn is_pixel_size(s: &str) -> bool {
    s.strip_suffix("px")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn leading_int(s: &str) -> Option<i64> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Named looks that restyle a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Professional,
    Creative,
    Minimal,
    Academic,
}

impl FromStr for Preset {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "professional" => Ok(Preset::Professional),
            "creative" => Ok(Preset::Creative),
            "minimal" => Ok(Preset::Minimal),
            "academic" => Ok(Preset::Academic),
            other => Err(TemplateError::InvalidValue {
                field: "preset".into(),
                value: other.into(),
                reason: "expected professional, creative, minimal or academic".into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Version history
// ---------------------------------------------------------------------------

/// A template captured by an explicit save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub id: Uuid,
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub template: ReportTemplate,
}

/// The most recent explicit saves, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateHistory {
    versions: VecDeque<TemplateVersion>,
    current_version: u32,
}

impl TemplateHistory {
    /// Record a save, dropping the oldest entry beyond [`HISTORY_LIMIT`].
    pub fn record(&mut self, template: &ReportTemplate) -> &TemplateVersion {
        self.current_version += 1;
        self.versions.push_front(TemplateVersion {
            id: Uuid::new_v4(),
            version: self.current_version,
            saved_at: Utc::now(),
            template: template.clone(),
        });
        self.versions.truncate(HISTORY_LIMIT);
        &self.versions[0]
    }

    pub fn versions(&self) -> impl Iterator<Item = &TemplateVersion> {
        self.versions.iter()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// The template saved under `id`.
    pub fn get(&self, id: Uuid) -> Result<&ReportTemplate, TemplateError> {
        self.versions
            .iter()
            .find(|v| v.id == id)
            .map(|v| &v.template)
            .ok_or_else(|| TemplateError::UnknownVersion(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(id: &str, name: &str) -> Packet {
        Packet {
            id: id.into(),
            name: name.into(),
            description: format!("{name} questions"),
            scoring_logic: String::new(),
            questions: vec![],
            scoring_scale: None,
            enable_scoring_scale: false,
        }
    }

    fn orders(t: &ReportTemplate) -> Vec<i64> {
        SectionId::ALL.iter().map(|id| t.placement(*id).1).collect()
    }

    #[test]
    fn default_section_order() {
        let t = ReportTemplate::default();
        assert_eq!(t.ordered_sections(), SectionId::RENDERED.to_vec());
        assert_eq!(t.footer.order, 7);
        assert_eq!(t.header.style.background_color, "#2563eb");
    }

    #[test]
    fn move_up_then_down_restores_orders() {
        let mut t = ReportTemplate::default();
        let before = orders(&t);

        assert!(t.move_section(SectionId::Charts, Direction::Up));
        assert_eq!(t.charts.order, 2);
        assert_eq!(t.overall_score.order, 3);
        assert_eq!(t.ordered_sections()[2], SectionId::Charts);

        assert!(t.move_section(SectionId::Charts, Direction::Down));
        assert_eq!(orders(&t), before);
    }

    #[test]
    fn move_skips_disabled_neighbours() {
        let mut t = ReportTemplate::default();
        t.toggle_section(SectionId::OverallScore);
        assert!(t.move_section(SectionId::Charts, Direction::Up));
        assert_eq!(t.charts.order, 1);
        assert_eq!(t.user_info.order, 3);
        // The disabled section keeps its order.
        assert_eq!(t.overall_score.order, 2);
    }

    #[test]
    fn move_at_edges_is_a_no_op() {
        let mut t = ReportTemplate::default();
        assert!(!t.move_section(SectionId::Header, Direction::Up));
        assert!(!t.move_section(SectionId::Footer, Direction::Down));
        assert!(!t.move_section(SectionId::Page, Direction::Up));
        assert_eq!(t, ReportTemplate::default());
    }

    #[test]
    fn ties_are_swapped_without_renumbering() {
        let mut t = ReportTemplate::default();
        t.charts.order = 2;
        assert!(t.move_section(SectionId::Charts, Direction::Up));
        assert_eq!((t.overall_score.order, t.charts.order), (2, 2));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut t = ReportTemplate::default();
        t.move_section(SectionId::Footer, Direction::Up);
        t.toggle_section(SectionId::Charts);
        t.reset_section_order();
        assert_eq!(orders(&t), orders(&ReportTemplate::default()));
        assert!(t.charts.enabled);
    }

    #[test]
    fn sync_adds_each_packet_once() {
        let packets = vec![packet("p1", "Stress"), packet("p2", "Sleep")];
        let mut t = ReportTemplate::default();
        assert_eq!(t.sync_packets(&packets), 2);
        assert_eq!(t.packet_configs["p2"].order, 2);
        assert_eq!(t.packet_configs["p2"].title, "Sleep");

        t.packet_configs.get_mut("p1").unwrap().title = "Renamed".into();
        assert_eq!(t.sync_packets(&packets[..1]), 0);
        assert_eq!(t.packet_configs["p1"].title, "Renamed");
        assert_eq!(t.packet_configs.len(), 2);
    }

    #[test]
    fn packet_ordering_operations() {
        let packets = vec![packet("p1", "A"), packet("p2", "B"), packet("p3", "C")];
        let mut t = ReportTemplate::default();
        t.sync_packets(&packets);

        assert!(t.move_packet("p3", Direction::Up, &packets));
        let names: Vec<_> = t
            .configured_packets(&packets)
            .iter()
            .map(|(p, _)| p.name.as_str())
            .collect();
        assert_eq!(names, ["A", "C", "B"]);

        assert!(!t.toggle_packet("p1").unwrap());
        assert_eq!(t.configured_packets(&packets).len(), 2);
        assert!(t.toggle_packet("missing").is_err());

        t.reset_packet_order(&packets);
        let names: Vec<_> = t
            .configured_packets(&packets)
            .iter()
            .map(|(p, _)| p.name.as_str())
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn partial_template_fills_defaults() {
        let t: ReportTemplate = serde_json::from_value(serde_json::json!({
            "header": {"title": "Custom", "backgroundColor": "#111111"},
            "charts": {"enabled": false, "order": 9},
            "packetConfigs": {"p1": {"title": "Stress", "chartType": "gauge"}}
        }))
        .unwrap();
        assert_eq!(t.header.title, "Custom");
        assert_eq!(t.header.style.background_color, "#111111");
        assert!(!t.charts.enabled);
        assert_eq!(t.user_info.order, 1);
        assert_eq!(t.packet_configs["p1"].chart_type, ChartType::Gauge);
        assert!(t.packet_configs["p1"].highlight_current_level);
    }

    #[test]
    fn serializes_camel_case_keys() {
        let json = serde_json::to_value(ReportTemplate::default()).unwrap();
        assert_eq!(json["userInfo"]["order"], 1);
        assert_eq!(json["header"]["backgroundColor"], "#2563eb");
        assert_eq!(json["page"]["size"], "A4");
        assert!(json["packetConfigs"].as_object().unwrap().is_empty());
    }

    #[test]
    fn validation_warnings() {
        let mut t = ReportTemplate::default();
        assert!(t.validate().is_empty());

        t.header.title = "  ".into();
        t.header.style.background_color = "blue".into();
        t.typography.heading_font_size = "2em".into();
        t.page.margin = "60mm".into();
        assert_eq!(t.validate().len(), 4);
    }

    #[test]
    fn presets_restyle_header_and_palette() {
        let mut t = ReportTemplate::default();
        t.apply_preset("academic".parse().unwrap());
        assert_eq!(t.header.style.background_color, "#059669");
        assert_eq!(t.typography.primary_font, "Times New Roman");
        assert!(t.validate().is_empty());
        assert!("flashy".parse::<Preset>().is_err());
    }

    #[test]
    fn history_keeps_last_ten() {
        let mut history = TemplateHistory::default();
        let mut t = ReportTemplate::default();
        let mut first_id = None;
        for i in 0..12 {
            t.header.title = format!("v{i}");
            let id = history.record(&t).id;
            first_id.get_or_insert(id);
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        let newest = history.versions().next().unwrap();
        assert_eq!(newest.version, 12);
        assert_eq!(newest.template.header.title, "v11");
        assert!(history.get(first_id.unwrap()).is_err());
    }
}
