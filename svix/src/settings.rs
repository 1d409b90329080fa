//! Environment settings reconciliation
//!
//! Settings are a singleton per environment and the update endpoint takes
//! the whole object, so a plan that mentions a handful of fields is merged
//! onto the settings just fetched from the server. Fields the plan leaves
//! unset keep their remote value, fields it nulls are cleared.

use tfplug::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::api::management::{
    BorderRadius, BorderRadiusConfig, CustomColorPalette, CustomStringsOverride,
    CustomThemeOverride, EnvironmentSettings, FontSizeConfig,
};
use crate::coerce::{ObjectReader, TriState};
use crate::error::ProviderError;

pub type SettingsSnapshot = EnvironmentSettings;
pub type SettingsPatch = EnvironmentSettings;

pub const WHITELABEL: &str = "whitelabel_settings";

/// Selecting this family requires `font_family_url`
pub const CUSTOM_FONT_FAMILY: &str = "Custom";

pub const FONT_FAMILIES: [&str; 13] = [
    "Helvetica",
    "Roboto",
    "Open Sans",
    "Lato",
    "Source Sans Pro",
    "Raleway",
    "Ubuntu",
    "Manrope",
    "DM Sans",
    "Poppins",
    "Lexend Deca",
    "Rubik",
    CUSTOM_FONT_FAMILY,
];

/// Terraform attribute name and the matching settings field, for the
/// top-level booleans.
macro_rules! settings_flags {
    ($macro:ident) => {
        $macro! {
            disable_endpoint_on_failure => disable_endpoint_on_failure,
            enable_channels => enable_channels,
            enable_endpoint_mtls_config => enable_endpoint_mtls_config,
            enable_endpoint_oauth_config => enable_endpoint_oauth_config,
            enable_integration_management => enable_integration_management,
            enable_advanced_endpoint_types => enable_message_stream,
            enable_transformations => enable_transformations,
            enforce_https => enforce_https,
            event_catalog_published => event_catalog_published,
            read_only => read_only,
            require_endpoint_channels => require_endpoint_channel,
            require_endpoint_event_types => require_endpoint_filter_types,
            whitelabel_headers => whitelabel_headers,
            delete_payload_on_successful_delivery => wipe_successful_payload,
        }
    };
}

macro_rules! flag_names {
    ($($attr:ident => $field:ident,)*) => {
        /// Top-level boolean attributes of `svix_environment_settings`
        pub const FLAG_ATTRIBUTES: &[&str] = &[$(stringify!($attr)),*];
    };
}

settings_flags!(flag_names);

/// The palette leaves shared by the light and dark palettes
pub const PALETTE_ATTRIBUTES: [&str; 9] = [
    "primary",
    "background_primary",
    "background_secondary",
    "background_hover",
    "interactive_accent",
    "navigation_accent",
    "button_primary",
    "text_primary",
    "text_danger",
];

macro_rules! declare_plan {
    ($($attr:ident => $field:ident,)*) => {
        /// The settings a plan asks for, one tri-state per attribute
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct SettingsPlan {
            $(pub $attr: TriState<bool>,)*
            /// `None` when the plan carries no whitelabel object
            pub whitelabel: Option<WhitelabelPlan>,
        }

        impl SettingsPlan {
            pub fn from_value(value: &DynamicValue) -> Result<Self, ProviderError> {
                let reader = ObjectReader::new(value);
                Ok(Self {
                    $($attr: reader.bool(stringify!($attr))?,)*
                    whitelabel: reader
                        .nested(WHITELABEL)
                        .map(|w| WhitelabelPlan::read(&w))
                        .transpose()?,
                })
            }

            fn apply_flags(&self, patch: &mut SettingsPatch) {
                $(self.$attr.clone().apply_to(&mut patch.$field);)*
            }
        }

        fn flags_to_state(settings: &EnvironmentSettings, state: &mut Vec<(&'static str, Dynamic)>) {
            $(state.push((stringify!($attr), settings.$field.into()));)*
        }
    };
}

settings_flags!(declare_plan);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhitelabelPlan {
    pub display_name: TriState<String>,
    pub base_font_size: TriState<i64>,
    pub font_family: TriState<String>,
    pub font_family_url: TriState<String>,
    pub logo_url: TriState<String>,
    pub color_palette_dark: Option<PalettePlan>,
    pub color_palette_light: Option<PalettePlan>,
    pub border_radius: Option<BorderRadiusPlan>,
    pub font_size: Option<FontSizePlan>,
    pub channels_strings_override: Option<StringsOverridePlan>,
}

impl WhitelabelPlan {
    fn read(reader: &ObjectReader<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            display_name: reader.string("display_name")?,
            base_font_size: reader.i64("base_font_size")?,
            font_family: reader.string("font_family")?,
            font_family_url: reader.string("font_family_url")?,
            logo_url: reader.string("logo_url")?,
            color_palette_dark: reader
                .nested("color_palette_dark")
                .map(|r| PalettePlan::read(&r))
                .transpose()?,
            color_palette_light: reader
                .nested("color_palette_light")
                .map(|r| PalettePlan::read(&r))
                .transpose()?,
            border_radius: reader
                .nested("border_radius")
                .map(|r| BorderRadiusPlan::read(&r))
                .transpose()?,
            font_size: reader
                .nested("font_size")
                .map(|r| r.i64("base").map(|base| FontSizePlan { base }))
                .transpose()?,
            channels_strings_override: reader
                .nested("channels_strings_override")
                .map(|r| StringsOverridePlan::read(&r))
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PalettePlan {
    pub primary: TriState<String>,
    pub background_primary: TriState<String>,
    pub background_secondary: TriState<String>,
    pub background_hover: TriState<String>,
    pub interactive_accent: TriState<String>,
    pub navigation_accent: TriState<String>,
    pub button_primary: TriState<String>,
    pub text_primary: TriState<String>,
    pub text_danger: TriState<String>,
}

impl PalettePlan {
    fn read(reader: &ObjectReader<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            primary: reader.string("primary")?,
            background_primary: reader.string("background_primary")?,
            background_secondary: reader.string("background_secondary")?,
            background_hover: reader.string("background_hover")?,
            interactive_accent: reader.string("interactive_accent")?,
            navigation_accent: reader.string("navigation_accent")?,
            button_primary: reader.string("button_primary")?,
            text_primary: reader.string("text_primary")?,
            text_danger: reader.string("text_danger")?,
        })
    }

    fn apply(&self, palette: &mut CustomColorPalette) {
        self.primary.clone().apply_to(&mut palette.primary);
        self.background_primary
            .clone()
            .apply_to(&mut palette.background_primary);
        self.background_secondary
            .clone()
            .apply_to(&mut palette.background_secondary);
        self.background_hover
            .clone()
            .apply_to(&mut palette.background_hover);
        self.interactive_accent
            .clone()
            .apply_to(&mut palette.interactive_accent);
        self.navigation_accent
            .clone()
            .apply_to(&mut palette.navigation_accent);
        self.button_primary.clone().apply_to(&mut palette.button_primary);
        self.text_primary.clone().apply_to(&mut palette.text_primary);
        self.text_danger.clone().apply_to(&mut palette.text_danger);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BorderRadiusPlan {
    pub button: TriState<String>,
    pub card: TriState<String>,
    pub input: TriState<String>,
}

impl BorderRadiusPlan {
    fn read(reader: &ObjectReader<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            button: reader.string("button")?,
            card: reader.string("card")?,
            input: reader.string("input")?,
        })
    }

    fn apply(&self, radius: &mut BorderRadiusConfig) -> Result<(), ProviderError> {
        for (name, planned, target) in [
            ("button", &self.button, &mut radius.button),
            ("card", &self.card, &mut radius.card),
            ("input", &self.input, &mut radius.input),
        ] {
            planned
                .clone()
                .try_map(|value| parse_border_radius(name, &value))?
                .apply_to(target);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontSizePlan {
    pub base: TriState<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringsOverridePlan {
    pub channels_help: TriState<String>,
    pub channels_many: TriState<String>,
    pub channels_one: TriState<String>,
}

impl StringsOverridePlan {
    fn read(reader: &ObjectReader<'_>) -> Result<Self, ProviderError> {
        Ok(Self {
            channels_help: reader.string("channels_help")?,
            channels_many: reader.string("channels_many")?,
            channels_one: reader.string("channels_one")?,
        })
    }

    fn apply(&self, strings: &mut CustomStringsOverride) {
        self.channels_help
            .clone()
            .apply_to(&mut strings.channels_help);
        self.channels_many
            .clone()
            .apply_to(&mut strings.channels_many);
        self.channels_one.clone().apply_to(&mut strings.channels_one);
    }
}

fn whitelabel_path(steps: &[&str]) -> AttributePath {
    steps
        .iter()
        .fold(AttributePath::new(WHITELABEL), |path, step| path.attribute(step))
}

fn parse_border_radius(name: &str, value: &str) -> Result<BorderRadius, ProviderError> {
    BorderRadius::parse(value).ok_or_else(|| {
        ProviderError::invalid_enum(
            whitelabel_path(&["border_radius", name]),
            value,
            BorderRadius::ALL,
        )
    })
}

/// A breach of the rule tying `font_family` to `font_family_url`
#[derive(Debug, Clone, PartialEq)]
pub struct FontRuleViolation {
    pub summary: &'static str,
    pub detail: &'static str,
    pub path: AttributePath,
}

impl FontRuleViolation {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.summary, self.detail).with_attribute(self.path.clone())
    }
}

impl From<FontRuleViolation> for ProviderError {
    fn from(violation: FontRuleViolation) -> Self {
        ProviderError::validation(violation.path, violation.detail)
    }
}

/// `Custom` needs a non-empty URL and a non-empty URL needs `Custom`.
pub fn check_font_rule(
    font_family: &TriState<String>,
    font_family_url: &TriState<String>,
) -> Option<FontRuleViolation> {
    let is_custom = font_family.as_value().map(String::as_str) == Some(CUSTOM_FONT_FAMILY);
    let has_url = font_family_url.as_value().is_some_and(|url| !url.is_empty());

    match (is_custom, has_url) {
        (false, true) => Some(FontRuleViolation {
            summary: "Invalid Font Configuration",
            detail: "When providing a font_family_url, the font_family attribute must be set to 'Custom'",
            path: whitelabel_path(&["font_family"]),
        }),
        (true, false) => Some(missing_font_url()),
        _ => None,
    }
}

fn missing_font_url() -> FontRuleViolation {
    FontRuleViolation {
        summary: "Missing Font URL",
        detail: "When font_family is set to 'Custom', a valid font_family_url must be provided",
        path: whitelabel_path(&["font_family_url"]),
    }
}

/// Merges `plan` onto `snapshot`. Any error aborts the whole merge.
pub fn reconcile(
    snapshot: &SettingsSnapshot,
    plan: &SettingsPlan,
) -> Result<SettingsPatch, ProviderError> {
    let mut patch = snapshot.clone();
    plan.apply_flags(&mut patch);

    let Some(whitelabel) = &plan.whitelabel else {
        tracing::debug!("plan carries no whitelabel settings, keeping remote values");
        return Ok(patch);
    };

    if let Some(violation) = check_font_rule(&whitelabel.font_family, &whitelabel.font_family_url)
    {
        return Err(violation.into());
    }
    if let Some(family) = whitelabel.font_family.as_value() {
        if !FONT_FAMILIES.contains(&family.as_str()) {
            return Err(ProviderError::invalid_enum(
                whitelabel_path(&["font_family"]),
                family,
                FONT_FAMILIES,
            ));
        }
    }

    whitelabel
        .display_name
        .clone()
        .apply_to(&mut patch.display_name);
    whitelabel
        .base_font_size
        .clone()
        .apply_to(&mut patch.custom_base_font_size);
    whitelabel
        .font_family
        .clone()
        .apply_to(&mut patch.custom_font_family);
    whitelabel
        .font_family_url
        .clone()
        .apply_to(&mut patch.custom_font_family_url);
    whitelabel.logo_url.clone().apply_to(&mut patch.custom_logo_url);

    if let Some(dark) = &whitelabel.color_palette_dark {
        dark.apply(patch.color_palette_dark.get_or_insert_with(Default::default));
    }
    if let Some(light) = &whitelabel.color_palette_light {
        light.apply(patch.color_palette_light.get_or_insert_with(Default::default));
    }
    if let Some(strings) = &whitelabel.channels_strings_override {
        strings.apply(
            patch
                .custom_strings_override
                .get_or_insert_with(Default::default),
        );
    }

    if whitelabel.border_radius.is_some() || whitelabel.font_size.is_some() {
        let theme: &mut CustomThemeOverride = patch
            .custom_theme_override
            .get_or_insert_with(Default::default);
        if let Some(radius) = &whitelabel.border_radius {
            radius.apply(theme.border_radius.get_or_insert_with(Default::default))?;
        }
        if let Some(font_size) = &whitelabel.font_size {
            let target: &mut FontSizeConfig = theme.font_size.get_or_insert_with(Default::default);
            font_size.base.clone().apply_to(&mut target.base);
        }
    }

    Ok(patch)
}

fn palette_to_state(palette: &Option<CustomColorPalette>) -> Dynamic {
    let Some(p) = palette else {
        return Dynamic::Null;
    };
    Dynamic::object([
        ("primary", p.primary.clone().into()),
        ("background_primary", p.background_primary.clone().into()),
        ("background_secondary", p.background_secondary.clone().into()),
        ("background_hover", p.background_hover.clone().into()),
        ("interactive_accent", p.interactive_accent.clone().into()),
        ("navigation_accent", p.navigation_accent.clone().into()),
        ("button_primary", p.button_primary.clone().into()),
        ("text_primary", p.text_primary.clone().into()),
        ("text_danger", p.text_danger.clone().into()),
    ])
}

fn whitelabel_to_state(settings: &EnvironmentSettings) -> Dynamic {
    let theme = settings.custom_theme_override.as_ref();
    let border_radius = theme
        .and_then(|t| t.border_radius.as_ref())
        .map_or(Dynamic::Null, |r| {
            Dynamic::object([
                ("button", r.button.map(|v| v.as_str()).into()),
                ("card", r.card.map(|v| v.as_str()).into()),
                ("input", r.input.map(|v| v.as_str()).into()),
            ])
        });
    let font_size = theme
        .and_then(|t| t.font_size.as_ref())
        .map_or(Dynamic::Null, |f| Dynamic::object([("base", f.base.into())]));
    let strings = settings
        .custom_strings_override
        .as_ref()
        .map_or(Dynamic::Null, |s| {
            Dynamic::object([
                ("channels_help", s.channels_help.clone().into()),
                ("channels_many", s.channels_many.clone().into()),
                ("channels_one", s.channels_one.clone().into()),
            ])
        });

    Dynamic::object([
        ("display_name", settings.display_name.clone().into()),
        ("base_font_size", settings.custom_base_font_size.into()),
        ("font_family", settings.custom_font_family.clone().into()),
        ("font_family_url", settings.custom_font_family_url.clone().into()),
        ("logo_url", settings.custom_logo_url.clone().into()),
        ("color_palette_dark", palette_to_state(&settings.color_palette_dark)),
        ("color_palette_light", palette_to_state(&settings.color_palette_light)),
        ("border_radius", border_radius),
        ("font_size", font_size),
        ("channels_strings_override", strings),
    ])
}

/// Terraform state for `settings`. The whitelabel object is always present,
/// its sub-objects are null where the server has none.
pub fn settings_to_state(environment_id: &str, settings: &EnvironmentSettings) -> DynamicValue {
    let mut entries: Vec<(&'static str, Dynamic)> = vec![("environment_id", environment_id.into())];
    flags_to_state(settings, &mut entries);
    entries.push((WHITELABEL, whitelabel_to_state(settings)));
    DynamicValue::new(Dynamic::object(entries))
}
