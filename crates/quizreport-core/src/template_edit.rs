//! Typed template mutations.
//!
//! Every settable leaf of a [`ReportTemplate`] is reachable through a
//! [`TemplateEdit`] variant. Dotted paths such as `header.title=Report` or
//! `packetConfigs.p1.chartType=gauge` are resolved to a variant once, at
//! parse time; applying an edit never walks strings.

use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::error::TemplateError;
use crate::template::{
    BoxStyle, Orientation, PacketConfig, PageSize, ReportTemplate, SectionId,
};

/// Lookup table between a field enum and its camelCase key.
trait FieldKey: Copy + 'static {
    const ALL: &'static [Self];

    fn key(self) -> &'static str;

    fn lookup(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == name)
    }
}

// ---------------------------------------------------------------------------
// Field enums
// ---------------------------------------------------------------------------

/// A member of [`BoxStyle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleField {
    BackgroundColor,
    BorderColor,
    FontSize,
    FontWeight,
    TextAlign,
    Padding,
    Margin,
    BorderRadius,
    BorderWidth,
    Shadow,
}

impl FieldKey for StyleField {
    const ALL: &'static [Self] = &[
        StyleField::BackgroundColor,
        StyleField::BorderColor,
        StyleField::FontSize,
        StyleField::FontWeight,
        StyleField::TextAlign,
        StyleField::Padding,
        StyleField::Margin,
        StyleField::BorderRadius,
        StyleField::BorderWidth,
        StyleField::Shadow,
    ];

    fn key(self) -> &'static str {
        match self {
            StyleField::BackgroundColor => "backgroundColor",
            StyleField::BorderColor => "borderColor",
            StyleField::FontSize => "fontSize",
            StyleField::FontWeight => "fontWeight",
            StyleField::TextAlign => "textAlign",
            StyleField::Padding => "padding",
            StyleField::Margin => "margin",
            StyleField::BorderRadius => "borderRadius",
            StyleField::BorderWidth => "borderWidth",
            StyleField::Shadow => "shadow",
        }
    }
}

impl StyleField {
    fn slot(self, style: &mut BoxStyle) -> &mut String {
        match self {
            StyleField::BackgroundColor => &mut style.background_color,
            StyleField::BorderColor => &mut style.border_color,
            StyleField::FontSize => &mut style.font_size,
            StyleField::FontWeight => &mut style.font_weight,
            StyleField::TextAlign => &mut style.text_align,
            StyleField::Padding => &mut style.padding,
            StyleField::Margin => &mut style.margin,
            StyleField::BorderRadius => &mut style.border_radius,
            StyleField::BorderWidth => &mut style.border_width,
            StyleField::Shadow => &mut style.shadow,
        }
    }
}

/// A boolean display switch on a section or settings block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    HeaderShowLogo,
    ShowAvatar,
    ShowEmail,
    ShowProfile,
    ShowDate,
    ShowPercentage,
    ShowGrade,
    ShowLevel,
    ShowTrend,
    ShowBarChart,
    ShowPieChart,
    ShowGaugeChart,
    ShowRadarChart,
    ShowPacketScores,
    ShowQuestionBreakdown,
    ShowTimeAnalysis,
    ShowDifficultyLevels,
    ShowStrengths,
    ShowWeaknesses,
    ShowImprovements,
    ShowComparisons,
    ShowActionItems,
    ShowResources,
    ShowTimeline,
    ShowPriority,
    FooterShowTimestamp,
    FooterShowPageNumbers,
    FooterShowCompanyInfo,
    FooterShowContactInfo,
    PageShowPageNumbers,
    PageShowWatermark,
    ShowIndividualScores,
    ShowQuestionDetails,
    ShowTimeSpent,
    ShowDifficultyAnalysis,
    ShowPerformanceTrends,
    ShowComparativeAnalysis,
    AlternateRowColors,
}

const FLAGS: &[(Flag, SectionId, &str)] = &[
    (Flag::HeaderShowLogo, SectionId::Header, "showLogo"),
    (Flag::ShowAvatar, SectionId::UserInfo, "showAvatar"),
    (Flag::ShowEmail, SectionId::UserInfo, "showEmail"),
    (Flag::ShowProfile, SectionId::UserInfo, "showProfile"),
    (Flag::ShowDate, SectionId::UserInfo, "showDate"),
    (Flag::ShowPercentage, SectionId::OverallScore, "showPercentage"),
    (Flag::ShowGrade, SectionId::OverallScore, "showGrade"),
    (Flag::ShowLevel, SectionId::OverallScore, "showLevel"),
    (Flag::ShowTrend, SectionId::OverallScore, "showTrend"),
    (Flag::ShowBarChart, SectionId::Charts, "showBarChart"),
    (Flag::ShowPieChart, SectionId::Charts, "showPieChart"),
    (Flag::ShowGaugeChart, SectionId::Charts, "showGaugeChart"),
    (Flag::ShowRadarChart, SectionId::Charts, "showRadarChart"),
    (Flag::ShowPacketScores, SectionId::SectionAnalysis, "showPacketScores"),
    (Flag::ShowQuestionBreakdown, SectionId::SectionAnalysis, "showQuestionBreakdown"),
    (Flag::ShowTimeAnalysis, SectionId::SectionAnalysis, "showTimeAnalysis"),
    (Flag::ShowDifficultyLevels, SectionId::SectionAnalysis, "showDifficultyLevels"),
    (Flag::ShowStrengths, SectionId::PerformanceInsights, "showStrengths"),
    (Flag::ShowWeaknesses, SectionId::PerformanceInsights, "showWeaknesses"),
    (Flag::ShowImprovements, SectionId::PerformanceInsights, "showImprovements"),
    (Flag::ShowComparisons, SectionId::PerformanceInsights, "showComparisons"),
    (Flag::ShowActionItems, SectionId::Recommendations, "showActionItems"),
    (Flag::ShowResources, SectionId::Recommendations, "showResources"),
    (Flag::ShowTimeline, SectionId::Recommendations, "showTimeline"),
    (Flag::ShowPriority, SectionId::Recommendations, "showPriority"),
    (Flag::FooterShowTimestamp, SectionId::Footer, "showTimestamp"),
    (Flag::FooterShowPageNumbers, SectionId::Footer, "showPageNumbers"),
    (Flag::FooterShowCompanyInfo, SectionId::Footer, "showCompanyInfo"),
    (Flag::FooterShowContactInfo, SectionId::Footer, "showContactInfo"),
    (Flag::PageShowPageNumbers, SectionId::Page, "showPageNumbers"),
    (Flag::PageShowWatermark, SectionId::Page, "showWatermark"),
    (Flag::ShowIndividualScores, SectionId::Packets, "showIndividualScores"),
    (Flag::ShowQuestionDetails, SectionId::Packets, "showQuestionDetails"),
    (Flag::ShowTimeSpent, SectionId::Packets, "showTimeSpent"),
    (Flag::ShowDifficultyAnalysis, SectionId::Packets, "showDifficultyAnalysis"),
    (Flag::ShowPerformanceTrends, SectionId::Packets, "showPerformanceTrends"),
    (Flag::ShowComparativeAnalysis, SectionId::Packets, "showComparativeAnalysis"),
    (Flag::AlternateRowColors, SectionId::Packets, "alternateRowColors"),
];

impl Flag {
    fn lookup(section: SectionId, name: &str) -> Option<Self> {
        FLAGS
            .iter()
            .find(|(_, s, k)| *s == section && *k == name)
            .map(|(f, _, _)| *f)
    }

    fn slot(self, t: &mut ReportTemplate) -> &mut bool {
        match self {
            Flag::HeaderShowLogo => &mut t.header.show_logo,
            Flag::ShowAvatar => &mut t.user_info.show_avatar,
            Flag::ShowEmail => &mut t.user_info.show_email,
            Flag::ShowProfile => &mut t.user_info.show_profile,
            Flag::ShowDate => &mut t.user_info.show_date,
            Flag::ShowPercentage => &mut t.overall_score.show_percentage,
            Flag::ShowGrade => &mut t.overall_score.show_grade,
            Flag::ShowLevel => &mut t.overall_score.show_level,
            Flag::ShowTrend => &mut t.overall_score.show_trend,
            Flag::ShowBarChart => &mut t.charts.show_bar_chart,
            Flag::ShowPieChart => &mut t.charts.show_pie_chart,
            Flag::ShowGaugeChart => &mut t.charts.show_gauge_chart,
            Flag::ShowRadarChart => &mut t.charts.show_radar_chart,
            Flag::ShowPacketScores => &mut t.section_analysis.show_packet_scores,
            Flag::ShowQuestionBreakdown => &mut t.section_analysis.show_question_breakdown,
            Flag::ShowTimeAnalysis => &mut t.section_analysis.show_time_analysis,
            Flag::ShowDifficultyLevels => &mut t.section_analysis.show_difficulty_levels,
            Flag::ShowStrengths => &mut t.performance_insights.show_strengths,
            Flag::ShowWeaknesses => &mut t.performance_insights.show_weaknesses,
            Flag::ShowImprovements => &mut t.performance_insights.show_improvements,
            Flag::ShowComparisons => &mut t.performance_insights.show_comparisons,
            Flag::ShowActionItems => &mut t.recommendations.show_action_items,
            Flag::ShowResources => &mut t.recommendations.show_resources,
            Flag::ShowTimeline => &mut t.recommendations.show_timeline,
            Flag::ShowPriority => &mut t.recommendations.show_priority,
            Flag::FooterShowTimestamp => &mut t.footer.show_timestamp,
            Flag::FooterShowPageNumbers => &mut t.footer.show_page_numbers,
            Flag::FooterShowCompanyInfo => &mut t.footer.show_company_info,
            Flag::FooterShowContactInfo => &mut t.footer.show_contact_info,
            Flag::PageShowPageNumbers => &mut t.page.show_page_numbers,
            Flag::PageShowWatermark => &mut t.page.show_watermark,
            Flag::ShowIndividualScores => &mut t.packets.show_individual_scores,
            Flag::ShowQuestionDetails => &mut t.packets.show_question_details,
            Flag::ShowTimeSpent => &mut t.packets.show_time_spent,
            Flag::ShowDifficultyAnalysis => &mut t.packets.show_difficulty_analysis,
            Flag::ShowPerformanceTrends => &mut t.packets.show_performance_trends,
            Flag::ShowComparativeAnalysis => &mut t.packets.show_comparative_analysis,
            Flag::AlternateRowColors => &mut t.packets.alternate_row_colors,
        }
    }
}

/// A free-text setting outside the shared style block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    HeaderTitle,
    HeaderSubtitle,
    HeaderTextColor,
    HeaderLogoPosition,
    ChartsLayout,
    ChartHeight,
    ChartWidth,
    PageBackgroundColor,
    PageMargin,
    WatermarkText,
    WatermarkOpacity,
    PrimaryFont,
    SecondaryFont,
    HeadingFontSize,
    SubheadingFontSize,
    BodyFontSize,
    CaptionFontSize,
    LineHeight,
    LetterSpacing,
    ColorPrimary,
    ColorSecondary,
    ColorSuccess,
    ColorWarning,
    ColorDanger,
    ColorInfo,
    ColorLight,
    ColorDark,
    RowBackgroundColor,
    RowAlternateBackgroundColor,
}

const TEXT_FIELDS: &[(TextField, SectionId, &str)] = &[
    (TextField::HeaderTitle, SectionId::Header, "title"),
    (TextField::HeaderSubtitle, SectionId::Header, "subtitle"),
    (TextField::HeaderTextColor, SectionId::Header, "textColor"),
    (TextField::HeaderLogoPosition, SectionId::Header, "logoPosition"),
    (TextField::ChartsLayout, SectionId::Charts, "layout"),
    (TextField::ChartHeight, SectionId::Charts, "chartHeight"),
    (TextField::ChartWidth, SectionId::Charts, "chartWidth"),
    (TextField::PageBackgroundColor, SectionId::Page, "backgroundColor"),
    (TextField::PageMargin, SectionId::Page, "margin"),
    (TextField::WatermarkText, SectionId::Page, "watermarkText"),
    (TextField::WatermarkOpacity, SectionId::Page, "watermarkOpacity"),
    (TextField::PrimaryFont, SectionId::Typography, "primaryFont"),
    (TextField::SecondaryFont, SectionId::Typography, "secondaryFont"),
    (TextField::HeadingFontSize, SectionId::Typography, "headingFontSize"),
    (TextField::SubheadingFontSize, SectionId::Typography, "subheadingFontSize"),
    (TextField::BodyFontSize, SectionId::Typography, "bodyFontSize"),
    (TextField::CaptionFontSize, SectionId::Typography, "captionFontSize"),
    (TextField::LineHeight, SectionId::Typography, "lineHeight"),
    (TextField::LetterSpacing, SectionId::Typography, "letterSpacing"),
    (TextField::ColorPrimary, SectionId::Colors, "primary"),
    (TextField::ColorSecondary, SectionId::Colors, "secondary"),
    (TextField::ColorSuccess, SectionId::Colors, "success"),
    (TextField::ColorWarning, SectionId::Colors, "warning"),
    (TextField::ColorDanger, SectionId::Colors, "danger"),
    (TextField::ColorInfo, SectionId::Colors, "info"),
    (TextField::ColorLight, SectionId::Colors, "light"),
    (TextField::ColorDark, SectionId::Colors, "dark"),
    (TextField::RowBackgroundColor, SectionId::Packets, "rowBackgroundColor"),
    (
        TextField::RowAlternateBackgroundColor,
        SectionId::Packets,
        "rowAlternateBackgroundColor",
    ),
];

impl TextField {
    fn lookup(section: SectionId, name: &str) -> Option<Self> {
        TEXT_FIELDS
            .iter()
            .find(|(_, s, k)| *s == section && *k == name)
            .map(|(f, _, _)| *f)
    }

    fn slot(self, t: &mut ReportTemplate) -> &mut String {
        match self {
            TextField::HeaderTitle => &mut t.header.title,
            TextField::HeaderSubtitle => &mut t.header.subtitle,
            TextField::HeaderTextColor => &mut t.header.text_color,
            TextField::HeaderLogoPosition => &mut t.header.logo_position,
            TextField::ChartsLayout => &mut t.charts.layout,
            TextField::ChartHeight => &mut t.charts.chart_height,
            TextField::ChartWidth => &mut t.charts.chart_width,
            TextField::PageBackgroundColor => &mut t.page.background_color,
            TextField::PageMargin => &mut t.page.margin,
            TextField::WatermarkText => &mut t.page.watermark_text,
            TextField::WatermarkOpacity => &mut t.page.watermark_opacity,
            TextField::PrimaryFont => &mut t.typography.primary_font,
            TextField::SecondaryFont => &mut t.typography.secondary_font,
            TextField::HeadingFontSize => &mut t.typography.heading_font_size,
            TextField::SubheadingFontSize => &mut t.typography.subheading_font_size,
            TextField::BodyFontSize => &mut t.typography.body_font_size,
            TextField::CaptionFontSize => &mut t.typography.caption_font_size,
            TextField::LineHeight => &mut t.typography.line_height,
            TextField::LetterSpacing => &mut t.typography.letter_spacing,
            TextField::ColorPrimary => &mut t.colors.primary,
            TextField::ColorSecondary => &mut t.colors.secondary,
            TextField::ColorSuccess => &mut t.colors.success,
            TextField::ColorWarning => &mut t.colors.warning,
            TextField::ColorDanger => &mut t.colors.danger,
            TextField::ColorInfo => &mut t.colors.info,
            TextField::ColorLight => &mut t.colors.light,
            TextField::ColorDark => &mut t.colors.dark,
            TextField::RowBackgroundColor => &mut t.packets.row_background_color,
            TextField::RowAlternateBackgroundColor => {
                &mut t.packets.row_alternate_background_color
            }
        }
    }
}

/// A boolean switch on a [`PacketConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketFlag {
    ShowHeader,
    ShowScoreBreakdown,
    ShowQuestionList,
    ShowPerformanceLevel,
    ShowRecommendations,
    ShowScalingLevel,
    ShowScalingLabel,
    ShowScalingImage,
    ShowScalingText,
    ShowScalingColors,
    ShowScalingRange,
    ShowAllScaleLevels,
    HighlightCurrentLevel,
    ShowScaleComparison,
    ShowImprovementSuggestions,
}

impl FieldKey for PacketFlag {
    const ALL: &'static [Self] = &[
        PacketFlag::ShowHeader,
        PacketFlag::ShowScoreBreakdown,
        PacketFlag::ShowQuestionList,
        PacketFlag::ShowPerformanceLevel,
        PacketFlag::ShowRecommendations,
        PacketFlag::ShowScalingLevel,
        PacketFlag::ShowScalingLabel,
        PacketFlag::ShowScalingImage,
        PacketFlag::ShowScalingText,
        PacketFlag::ShowScalingColors,
        PacketFlag::ShowScalingRange,
        PacketFlag::ShowAllScaleLevels,
        PacketFlag::HighlightCurrentLevel,
        PacketFlag::ShowScaleComparison,
        PacketFlag::ShowImprovementSuggestions,
    ];

    fn key(self) -> &'static str {
        match self {
            PacketFlag::ShowHeader => "showHeader",
            PacketFlag::ShowScoreBreakdown => "showScoreBreakdown",
            PacketFlag::ShowQuestionList => "showQuestionList",
            PacketFlag::ShowPerformanceLevel => "showPerformanceLevel",
            PacketFlag::ShowRecommendations => "showRecommendations",
            PacketFlag::ShowScalingLevel => "showScalingLevel",
            PacketFlag::ShowScalingLabel => "showScalingLabel",
            PacketFlag::ShowScalingImage => "showScalingImage",
            PacketFlag::ShowScalingText => "showScalingText",
            PacketFlag::ShowScalingColors => "showScalingColors",
            PacketFlag::ShowScalingRange => "showScalingRange",
            PacketFlag::ShowAllScaleLevels => "showAllScaleLevels",
            PacketFlag::HighlightCurrentLevel => "highlightCurrentLevel",
            PacketFlag::ShowScaleComparison => "showScaleComparison",
            PacketFlag::ShowImprovementSuggestions => "showImprovementSuggestions",
        }
    }
}

impl PacketFlag {
    fn slot(self, c: &mut PacketConfig) -> &mut bool {
        match self {
            PacketFlag::ShowHeader => &mut c.show_header,
            PacketFlag::ShowScoreBreakdown => &mut c.show_score_breakdown,
            PacketFlag::ShowQuestionList => &mut c.show_question_list,
            PacketFlag::ShowPerformanceLevel => &mut c.show_performance_level,
            PacketFlag::ShowRecommendations => &mut c.show_recommendations,
            PacketFlag::ShowScalingLevel => &mut c.show_scaling_level,
            PacketFlag::ShowScalingLabel => &mut c.show_scaling_label,
            PacketFlag::ShowScalingImage => &mut c.show_scaling_image,
            PacketFlag::ShowScalingText => &mut c.show_scaling_text,
            PacketFlag::ShowScalingColors => &mut c.show_scaling_colors,
            PacketFlag::ShowScalingRange => &mut c.show_scaling_range,
            PacketFlag::ShowAllScaleLevels => &mut c.show_all_scale_levels,
            PacketFlag::HighlightCurrentLevel => &mut c.highlight_current_level,
            PacketFlag::ShowScaleComparison => &mut c.show_scale_comparison,
            PacketFlag::ShowImprovementSuggestions => &mut c.show_improvement_suggestions,
        }
    }
}

/// A free-text setting on a [`PacketConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketText {
    Title,
    Description,
    HeaderBackgroundColor,
    HeaderTextColor,
    ScoreColor,
    CustomIcon,
    CustomLabel,
}

impl FieldKey for PacketText {
    const ALL: &'static [Self] = &[
        PacketText::Title,
        PacketText::Description,
        PacketText::HeaderBackgroundColor,
        PacketText::HeaderTextColor,
        PacketText::ScoreColor,
        PacketText::CustomIcon,
        PacketText::CustomLabel,
    ];

    fn key(self) -> &'static str {
        match self {
            PacketText::Title => "title",
            PacketText::Description => "description",
            PacketText::HeaderBackgroundColor => "headerBackgroundColor",
            PacketText::HeaderTextColor => "headerTextColor",
            PacketText::ScoreColor => "scoreColor",
            PacketText::CustomIcon => "customIcon",
            PacketText::CustomLabel => "customLabel",
        }
    }
}

impl PacketText {
    fn slot(self, c: &mut PacketConfig) -> &mut String {
        match self {
            PacketText::Title => &mut c.title,
            PacketText::Description => &mut c.description,
            PacketText::HeaderBackgroundColor => &mut c.header_background_color,
            PacketText::HeaderTextColor => &mut c.header_text_color,
            PacketText::ScoreColor => &mut c.score_color,
            PacketText::CustomIcon => &mut c.custom_icon,
            PacketText::CustomLabel => &mut c.custom_label,
        }
    }
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

/// A single change to one packet's config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketEdit {
    Enabled(bool),
    Order(i64),
    Flag(PacketFlag, bool),
    Text(PacketText, String),
    Style(StyleField, String),
    ChartType(crate::template::ChartType),
    ChartColors(Vec<String>),
    ImageDisplayStyle(crate::template::ImageDisplayStyle),
    TextDisplayPosition(crate::template::TextDisplayPosition),
    LevelIndicatorStyle(crate::template::LevelIndicatorStyle),
    ScaleProgressStyle(crate::template::ScaleProgressStyle),
}

/// A single change to a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateEdit {
    Enabled(SectionId, bool),
    Order(SectionId, i64),
    Style(SectionId, StyleField, String),
    Flag(Flag, bool),
    Text(TextField, String),
    PageSize(PageSize),
    Orientation(Orientation),
    GridColumns(u32),
    Packet { packet_id: String, edit: PacketEdit },
}

impl TemplateEdit {
    /// Parse `path=value`, e.g. `charts.enabled=false`.
    pub fn parse(input: &str) -> Result<Self, TemplateError> {
        let (path, value) = input
            .split_once('=')
            .ok_or_else(|| TemplateError::Malformed(input.to_string()))?;
        let path = path.trim();
        let value = value.trim();
        let segments: Vec<&str> = path.split('.').collect();

        match segments.as_slice() {
            ["packetConfigs" | "packet", packet_id, field] => Ok(TemplateEdit::Packet {
                packet_id: (*packet_id).to_string(),
                edit: parse_packet_edit(path, field, value)?,
            }),
            [section, field] => {
                let section: SectionId = section.parse()?;
                parse_section_edit(path, section, field, value)
            }
            _ => Err(TemplateError::UnknownField(path.to_string())),
        }
    }
}

impl FromStr for TemplateEdit {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateEdit::parse(s)
    }
}

fn parse_section_edit(
    path: &str,
    section: SectionId,
    field: &str,
    value: &str,
) -> Result<TemplateEdit, TemplateError> {
    match field {
        "enabled" => return Ok(TemplateEdit::Enabled(section, parse_bool(path, value)?)),
        "order" => return Ok(TemplateEdit::Order(section, parse_int(path, value)?)),
        _ => {}
    }
    if let Some(flag) = Flag::lookup(section, field) {
        return Ok(TemplateEdit::Flag(flag, parse_bool(path, value)?));
    }
    if let Some(text) = TextField::lookup(section, field) {
        return Ok(TemplateEdit::Text(text, value.to_string()));
    }
    match (section, field) {
        (SectionId::Page, "size") => return Ok(TemplateEdit::PageSize(parse_keyword(path, value)?)),
        (SectionId::Page, "orientation") => {
            return Ok(TemplateEdit::Orientation(parse_keyword(path, value)?))
        }
        (SectionId::Charts, "gridColumns") => {
            let columns = parse_int(path, value)?;
            let columns = u32::try_from(columns).map_err(|_| invalid(path, value, "expected a positive number"))?;
            return Ok(TemplateEdit::GridColumns(columns));
        }
        _ => {}
    }
    match StyleField::lookup(field) {
        Some(style) if section != SectionId::Page
            && section != SectionId::Typography
            && section != SectionId::Colors =>
        {
            Ok(TemplateEdit::Style(section, style, value.to_string()))
        }
        _ => Err(TemplateError::UnknownField(path.to_string())),
    }
}

fn parse_packet_edit(path: &str, field: &str, value: &str) -> Result<PacketEdit, TemplateError> {
    if let Some(flag) = PacketFlag::lookup(field) {
        return Ok(PacketEdit::Flag(flag, parse_bool(path, value)?));
    }
    if let Some(text) = PacketText::lookup(field) {
        return Ok(PacketEdit::Text(text, value.to_string()));
    }
    if let Some(style) = StyleField::lookup(field) {
        return Ok(PacketEdit::Style(style, value.to_string()));
    }
    Ok(match field {
        "enabled" => PacketEdit::Enabled(parse_bool(path, value)?),
        "order" => PacketEdit::Order(parse_int(path, value)?),
        "chartType" => PacketEdit::ChartType(parse_keyword(path, value)?),
        "chartColors" => PacketEdit::ChartColors(
            value
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect(),
        ),
        "imageDisplayStyle" => PacketEdit::ImageDisplayStyle(parse_keyword(path, value)?),
        "textDisplayPosition" => PacketEdit::TextDisplayPosition(parse_keyword(path, value)?),
        "levelIndicatorStyle" => PacketEdit::LevelIndicatorStyle(parse_keyword(path, value)?),
        "scaleProgressStyle" => PacketEdit::ScaleProgressStyle(parse_keyword(path, value)?),
        _ => return Err(TemplateError::UnknownField(path.to_string())),
    })
}

fn invalid(field: &str, value: &str, reason: &str) -> TemplateError {
    TemplateError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, TemplateError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(field, value, "expected true or false")),
    }
}

fn parse_int(field: &str, value: &str) -> Result<i64, TemplateError> {
    value
        .parse()
        .map_err(|_| invalid(field, value, "expected an integer"))
}

/// Parse a keyword into one of the template's serde enums.
fn parse_keyword<T: DeserializeOwned>(field: &str, value: &str) -> Result<T, TemplateError> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(|e| invalid(field, value, &e.to_string()))
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

impl ReportTemplate {
    /// Return a copy of this template with `edit` applied.
    pub fn apply(&self, edit: &TemplateEdit) -> Result<ReportTemplate, TemplateError> {
        let mut next = self.clone();
        match edit {
            TemplateEdit::Enabled(section, value) => *next.placement_mut(*section).0 = *value,
            TemplateEdit::Order(section, value) => *next.placement_mut(*section).1 = *value,
            TemplateEdit::Style(section, field, value) => {
                let style = next
                    .style_mut(*section)
                    .ok_or_else(|| TemplateError::UnknownField(format!("{section}.{}", field.key())))?;
                *field.slot(style) = value.clone();
            }
            TemplateEdit::Flag(flag, value) => *flag.slot(&mut next) = *value,
            TemplateEdit::Text(field, value) => *field.slot(&mut next) = value.clone(),
            TemplateEdit::PageSize(size) => next.page.size = *size,
            TemplateEdit::Orientation(orientation) => next.page.orientation = *orientation,
            TemplateEdit::GridColumns(columns) => next.charts.grid_columns = *columns,
            TemplateEdit::Packet { packet_id, edit } => {
                let config = next
                    .packet_configs
                    .get_mut(packet_id)
                    .ok_or_else(|| TemplateError::UnknownPacket(packet_id.clone()))?;
                apply_packet_edit(config, edit);
            }
        }
        Ok(next)
    }
}

fn apply_packet_edit(config: &mut PacketConfig, edit: &PacketEdit) {
    match edit {
        PacketEdit::Enabled(v) => config.enabled = *v,
        PacketEdit::Order(v) => config.order = *v,
        PacketEdit::Flag(flag, v) => *flag.slot(config) = *v,
        PacketEdit::Text(field, v) => *field.slot(config) = v.clone(),
        PacketEdit::Style(field, v) => *field.slot(&mut config.style) = v.clone(),
        PacketEdit::ChartType(v) => config.chart_type = *v,
        PacketEdit::ChartColors(v) => config.chart_colors = v.clone(),
        PacketEdit::ImageDisplayStyle(v) => config.image_display_style = *v,
        PacketEdit::TextDisplayPosition(v) => config.text_display_position = *v,
        PacketEdit::LevelIndicatorStyle(v) => config.level_indicator_style = *v,
        PacketEdit::ScaleProgressStyle(v) => config.scale_progress_style = *v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{ChartType, ScaleProgressStyle};

    fn with_packet() -> ReportTemplate {
        let mut t = ReportTemplate::default();
        t.packet_configs
            .insert("p1".into(), PacketConfig { title: "Stress".into(), ..PacketConfig::default() });
        t
    }

    #[test]
    fn apply_returns_new_value() {
        let original = ReportTemplate::default();
        let edit = TemplateEdit::parse("header.title=Quarterly Review").unwrap();
        let edited = original.apply(&edit).unwrap();
        assert_eq!(edited.header.title, "Quarterly Review");
        assert_eq!(original.header.title, "Assessment Report");
    }

    #[test]
    fn parses_section_fields() {
        assert_eq!(
            TemplateEdit::parse("charts.enabled=false").unwrap(),
            TemplateEdit::Enabled(SectionId::Charts, false)
        );
        assert_eq!(
            TemplateEdit::parse("footer.order = 3").unwrap(),
            TemplateEdit::Order(SectionId::Footer, 3)
        );
        assert_eq!(
            TemplateEdit::parse("userInfo.showEmail=no").unwrap(),
            TemplateEdit::Flag(Flag::ShowEmail, false)
        );
        assert_eq!(
            TemplateEdit::parse("page.size=Letter").unwrap(),
            TemplateEdit::PageSize(PageSize::Letter)
        );
        assert_eq!(
            TemplateEdit::parse("page.backgroundColor=#fafafa").unwrap(),
            TemplateEdit::Text(TextField::PageBackgroundColor, "#fafafa".into())
        );
        assert_eq!(
            TemplateEdit::parse("header.backgroundColor=#111827").unwrap(),
            TemplateEdit::Style(SectionId::Header, StyleField::BackgroundColor, "#111827".into())
        );
    }

    #[test]
    fn same_key_resolves_per_section() {
        let footer = TemplateEdit::parse("footer.showPageNumbers=false").unwrap();
        let page = TemplateEdit::parse("page.showPageNumbers=false").unwrap();
        let t = ReportTemplate::default().apply(&footer).unwrap();
        assert!(!t.footer.show_page_numbers);
        assert!(t.page.show_page_numbers);
        let t = ReportTemplate::default().apply(&page).unwrap();
        assert!(!t.page.show_page_numbers);
    }

    #[test]
    fn packet_edits() {
        let t = with_packet();
        let t = t
            .apply(&"packetConfigs.p1.chartType=gauge".parse().unwrap())
            .unwrap()
            .apply(&"packet.p1.scaleProgressStyle=dots".parse().unwrap())
            .unwrap()
            .apply(&"packet.p1.chartColors=#000000, #ffffff".parse().unwrap())
            .unwrap()
            .apply(&"packet.p1.showScalingRange=true".parse().unwrap())
            .unwrap();
        let cfg = &t.packet_configs["p1"];
        assert_eq!(cfg.chart_type, ChartType::Gauge);
        assert_eq!(cfg.scale_progress_style, ScaleProgressStyle::Dots);
        assert_eq!(cfg.chart_colors, ["#000000", "#ffffff"]);
        assert!(cfg.show_scaling_range);
    }

    #[test]
    fn unknown_packet_is_rejected() {
        let edit = TemplateEdit::parse("packet.zzz.title=X").unwrap();
        assert_eq!(
            ReportTemplate::default().apply(&edit),
            Err(TemplateError::UnknownPacket("zzz".into()))
        );
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(
            TemplateEdit::parse("header.title"),
            Err(TemplateError::Malformed(_))
        ));
        assert!(matches!(
            TemplateEdit::parse("header.nonsense=1"),
            Err(TemplateError::UnknownField(_))
        ));
        assert!(matches!(
            TemplateEdit::parse("sidebar.enabled=true"),
            Err(TemplateError::UnknownField(_))
        ));
        assert!(matches!(
            TemplateEdit::parse("charts.enabled=maybe"),
            Err(TemplateError::InvalidValue { .. })
        ));
        assert!(matches!(
            TemplateEdit::parse("packet.p1.chartType=donut"),
            Err(TemplateError::InvalidValue { .. })
        ));
        // Settings blocks carry no box style.
        assert!(matches!(
            TemplateEdit::parse("typography.padding=4px"),
            Err(TemplateError::UnknownField(_))
        ));
    }
}
