//! The built-in parameter table.

use super::entry::{
    Companion, Conflict, Element, NumberRange, ParameterSpec, PromptRequirement, Requirement,
    Tuple, ValueType,
};

pub const CROP_VALUES: &[&str] = &["force", "at_max", "at_max_enlarge", "at_least", "maintain_ratio"];

pub const CROP_MODE_VALUES: &[&str] = &["pad_resize", "pad_extract", "extract"];

pub const FORMAT_VALUES: &[&str] = &[
    "auto", "webp", "jpg", "jpeg", "png", "gif", "svg", "avif", "orig",
];

/// Object classes the focus detector recognises.
pub const OBJECT_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic_light", "fire_hydrant", "stop_sign", "parking_meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports_ball", "kite",
    "baseball_bat", "baseball_glove", "skateboard", "surfboard", "tennis_racket", "bottle",
    "wine_glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot_dog", "pizza", "donut", "cake", "chair", "couch", "potted_plant",
    "bed", "dining_table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell_phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy_bear", "hair_drier", "toothbrush",
];

/// Positional, detector and object focus values.
pub const FOCUS_VALUES: &[&str] = &[
    "center", "top", "left", "bottom", "right", "top_left", "top_right", "bottom_left",
    "bottom_right", "auto", "face", "custom",
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic_light", "fire_hydrant", "stop_sign", "parking_meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports_ball", "kite",
    "baseball_bat", "baseball_glove", "skateboard", "surfboard", "tennis_racket", "bottle",
    "wine_glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot_dog", "pizza", "donut", "cake", "chair", "couch", "potted_plant",
    "bed", "dining_table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell_phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy_bear", "hair_drier", "toothbrush",
];

/// Positions accepted by overlay `lfo`.
pub const LAYER_FOCUS_VALUES: &[&str] = &[
    "center", "top", "left", "bottom", "right", "top_left", "top_right", "bottom_left",
    "bottom_right",
];

/// Fonts the CDN ships; anything else must be a font file in the media library.
pub const FONT_FAMILIES: &[&str] = &[
    "AbrilFatFace", "Amaranth", "Arvo", "Audiowide", "Chivo", "Crimson Text", "exo",
    "Fredoka One", "Gravitas One", "Kanit", "Lato", "Lobster", "Lora", "Monoton", "Montserrat",
    "PT Mono", "PT_Serif", "Open Sans", "Roboto", "Old Standard", "Ubuntu", "Vollkorn",
];

pub const TYPOGRAPHY_VALUES: &[&str] = &[
    "b", "i", "strikethrough", "b_i", "b_strikethrough", "i_strikethrough", "b_i_strikethrough",
];

pub const LAYER_MODE_VALUES: &[&str] = &["multiply", "cutout", "cutter"];

const FLIP_VALUES: &[&str] = &["h", "v", "h_v"];

const EXTRACT_MODES: &[Companion] = &[Companion::one_of("cm", &["extract", "pad_extract"])];
const NOT_WITH_FORCE_CROP: &[Conflict] = &[Conflict::reject(&[Companion::one_of("c", &["force"])])];
const DIMENSION: NumberRange = NumberRange::positive().with_keywords(&["auto"]);
const COORDINATE: NumberRange = NumberRange::at_least(0.0);

/// Drop-shadow defaults the CDN applies when a modifier is omitted.
pub const DEFAULT_SHADOW_AZIMUTH: f64 = 215.0;
pub const DEFAULT_SHADOW_ELEVATION: f64 = 45.0;
pub const DEFAULT_SHADOW_SATURATION: f64 = 60.0;

/// Shadow and gradient defaults, recorded like the drop-shadow ones.
pub const DEFAULT_SHADOW_BLUR: f64 = 10.0;
pub const DEFAULT_PLAIN_SHADOW_SATURATION: f64 = 30.0;
pub const DEFAULT_SHADOW_OFFSET: f64 = 2.0;
pub const DEFAULT_GRADIENT_DIRECTION: f64 = 180.0;
pub const DEFAULT_GRADIENT_STOP: f64 = 1.0;

const GRADIENT_DIRECTIONS: &[&str] = &[
    "top", "left", "bottom", "right", "top_left", "top_right", "bottom_left", "bottom_right",
];

const POSITIVE: Element = Element::Number(NumberRange::positive());
const OFFSET: Element = Element::Number(NumberRange::ANY);

/// Input size ceiling for retouch and upscale.
pub const AI_ENHANCE_MAX_MEGAPIXELS: f64 = 16.0;

pub static CATALOG: &[ParameterSpec] = &[
    // Dimensions
    ParameterSpec::new("width", "w", ValueType::ArithmeticExpression(DIMENSION))
        .aliases(&["w"])
        .describe("Output width in pixels"),
    ParameterSpec::new("height", "h", ValueType::ArithmeticExpression(DIMENSION))
        .aliases(&["h"])
        .describe("Output height in pixels"),
    ParameterSpec::new("width_ratio", "w", ValueType::Percentage)
        .describe("Output width as a fraction of the input width"),
    ParameterSpec::new("height_ratio", "h", ValueType::Percentage)
        .describe("Output height as a fraction of the input height"),
    ParameterSpec::new("aspect_ratio", "ar", ValueType::AspectRatio)
        .aliases(&["ar"])
        .conflicts(&[Conflict::drop_this(&[Companion::code("w"), Companion::code("h")])])
        .describe("Aspect ratio as `<w>-<h>`; ignored when both width and height are set"),
    // Crop and resize
    ParameterSpec::new("crop", "c", ValueType::Enum(CROP_VALUES))
        .aliases(&["c"])
        .describe("Resize strategy that may crop or stretch"),
    ParameterSpec::new("crop_mode", "cm", ValueType::Enum(CROP_MODE_VALUES))
        .aliases(&["cm"])
        .requires(&[Requirement::when(
            &["pad_resize"],
            &[Companion::code("w"), Companion::code("h")],
        )])
        .describe("Padding and extraction strategy"),
    ParameterSpec::new("focus", "fo", ValueType::Enum(FOCUS_VALUES))
        .aliases(&["fo"])
        .conflicts(NOT_WITH_FORCE_CROP)
        .describe("Region kept when cropping"),
    ParameterSpec::new("zoom", "z", ValueType::Number(NumberRange::positive()))
        .aliases(&["z"])
        .conflicts(NOT_WITH_FORCE_CROP)
        .describe("Zoom around the focused object"),
    ParameterSpec::new("x", "x", ValueType::ArithmeticExpression(COORDINATE))
        .requires(&[Requirement::always(EXTRACT_MODES)])
        .conflicts(&[
            Conflict::reject(&[Companion::code("xc")]),
            Conflict::reject(&[Companion::code("yc")]),
        ]),
    ParameterSpec::new("y", "y", ValueType::ArithmeticExpression(COORDINATE))
        .requires(&[Requirement::always(EXTRACT_MODES)])
        .conflicts(&[
            Conflict::reject(&[Companion::code("xc")]),
            Conflict::reject(&[Companion::code("yc")]),
        ]),
    ParameterSpec::new("x_center", "xc", ValueType::ArithmeticExpression(COORDINATE))
        .aliases(&["xc"])
        .requires(&[Requirement::always(EXTRACT_MODES)]),
    ParameterSpec::new("y_center", "yc", ValueType::ArithmeticExpression(COORDINATE))
        .aliases(&["yc"])
        .requires(&[Requirement::always(EXTRACT_MODES)]),
    ParameterSpec::new(
        "dpr",
        "dpr",
        ValueType::Number(NumberRange::between(0.1, 5.0).with_keywords(&["auto"])),
    )
    .describe("Device pixel ratio"),
    ParameterSpec::new("background", "bg", ValueType::Color(&["blurred", "dominant"]))
        .aliases(&["bg"])
        .describe("Padding background colour"),
    // Output
    ParameterSpec::new("quality", "q", ValueType::Number(NumberRange::between(1.0, 100.0)))
        .aliases(&["q"]),
    ParameterSpec::new("format", "f", ValueType::Enum(FORMAT_VALUES)).aliases(&["f"]),
    // Effects
    ParameterSpec::new("blur", "bl", ValueType::Number(NumberRange::between(1.0, 100.0)))
        .aliases(&["bl"]),
    ParameterSpec::new("grayscale", "e-grayscale", ValueType::Flag),
    ParameterSpec::new("contrast", "e-contrast", ValueType::Flag),
    ParameterSpec::new(
        "sharpen",
        "e-sharpen",
        ValueType::FlagOrNumber {
            range: NumberRange::at_least(0.0),
            flag_value: None,
        },
    )
    .describe("Sharpen; `true` or 0 uses the default strength"),
    ParameterSpec::new(
        "unsharp_mask",
        "e-usm",
        ValueType::Tuple(Tuple::new('-', &[POSITIVE, POSITIVE, POSITIVE, POSITIVE])),
    )
    .aliases(&["e-usm"])
    .describe("`<radius>-<sigma>-<amount>-<threshold>`"),
    ParameterSpec::new("shadow", "e-shadow", ValueType::Flag)
        .aliases(&["e-shadow"])
        .describe("Non-AI shadow under the object"),
    ParameterSpec::new("shadow_blur", "bl", ValueType::Number(NumberRange::between(0.0, 15.0).whole()))
        .modifies("shadow")
        .default_value(DEFAULT_SHADOW_BLUR),
    ParameterSpec::new(
        "shadow_saturation",
        "st",
        ValueType::Number(NumberRange::between(0.0, 100.0).whole()),
    )
    .modifies("shadow")
    .default_value(DEFAULT_PLAIN_SHADOW_SATURATION),
    ParameterSpec::new("shadow_offset_x", "x", ValueType::Number(NumberRange::ANY))
        .modifies("shadow")
        .default_value(DEFAULT_SHADOW_OFFSET),
    ParameterSpec::new("shadow_offset_y", "y", ValueType::Number(NumberRange::ANY))
        .modifies("shadow")
        .default_value(DEFAULT_SHADOW_OFFSET),
    ParameterSpec::new("gradient", "e-gradient", ValueType::Flag)
        .aliases(&["e-gradient"])
        .describe("Linear gradient overlay"),
    ParameterSpec::new(
        "gradient_direction",
        "ld",
        ValueType::Number(NumberRange::between(0.0, 360.0).with_keywords(GRADIENT_DIRECTIONS)),
    )
    .modifies("gradient")
    .default_value(DEFAULT_GRADIENT_DIRECTION),
    ParameterSpec::new("gradient_from", "from", ValueType::Color(&[])).modifies("gradient"),
    ParameterSpec::new("gradient_to", "to", ValueType::Color(&[])).modifies("gradient"),
    ParameterSpec::new("gradient_stop", "sp", ValueType::Number(NumberRange::positive()))
        .modifies("gradient")
        .default_value(DEFAULT_GRADIENT_STOP),
    ParameterSpec::new(
        "perspective_distort",
        "e-distort",
        ValueType::Tuple(
            Tuple::new('_', &[OFFSET, OFFSET, OFFSET, OFFSET, OFFSET, OFFSET, OFFSET, OFFSET])
                .prefixed("p-"),
        ),
    )
    .describe("Move the four corners: `x1_y1_x2_y2_x3_y3_x4_y4`"),
    ParameterSpec::new(
        "arc_distort",
        "e-distort",
        ValueType::Tuple(
            Tuple::new('_', &[Element::Number(NumberRange::between(-360.0, 360.0))]).prefixed("a-"),
        ),
    )
    .describe("Bend the image along an arc of the given degrees"),
    ParameterSpec::new(
        "color_replace",
        "cr",
        ValueType::Tuple(
            Tuple::new(
                '_',
                &[
                    Element::Color,
                    Element::Number(NumberRange::between(0.0, 100.0).whole()),
                    Element::Color,
                ],
            )
            .min_required(2),
        ),
    )
    .aliases(&["cr"])
    .describe("`<to>_<tolerance>` or `<from>_<tolerance>_<to>`"),
    ParameterSpec::new(
        "border",
        "b",
        ValueType::Tuple(Tuple::new('_', &[POSITIVE, Element::Color])),
    )
    .aliases(&["b"])
    .describe("`<width>_<colour>`"),
    ParameterSpec::new(
        "trim",
        "t",
        ValueType::FlagOrNumber {
            range: NumberRange::between(1.0, 99.0).whole(),
            flag_value: Some("true"),
        },
    )
    .aliases(&["t"])
    .describe("Trim a solid border; a number sets the tolerance"),
    ParameterSpec::new(
        "rotate",
        "rt",
        ValueType::ArithmeticExpression(NumberRange::between(-360.0, 360.0).with_keywords(&["auto"])),
    )
    .aliases(&["rt"]),
    ParameterSpec::new("flip", "fl", ValueType::Enum(FLIP_VALUES)).aliases(&["fl"]),
    ParameterSpec::new(
        "radius",
        "r",
        ValueType::ArithmeticExpression(NumberRange::positive().with_keywords(&["max"])),
    )
    .aliases(&["r"])
    .describe("Corner radius"),
    ParameterSpec::new("opacity", "o", ValueType::Number(NumberRange::between(0.0, 100.0)))
        .aliases(&["o"]),
    // AI operations
    ParameterSpec::new("remove_background", "e-bgremove", ValueType::Flag)
        .aliases(&["e-bgremove"])
        .ai()
        .in_layers()
        .describe("Cost-efficient background removal"),
    ParameterSpec::new("remove_background_external", "e-removedotbg", ValueType::Flag)
        .aliases(&["e-removedotbg"])
        .ai()
        .describe("High-accuracy background removal"),
    ParameterSpec::new("drop_shadow", "e-dropshadow", ValueType::Flag)
        .aliases(&["e-dropshadow"])
        .ai()
        .in_layers()
        .describe("Realistic drop shadow; needs a transparent background"),
    ParameterSpec::new("azimuth", "az", ValueType::Number(NumberRange::between(0.0, 360.0)))
        .aliases(&["az"])
        .modifies("drop_shadow")
        .default_value(DEFAULT_SHADOW_AZIMUTH),
    ParameterSpec::new("elevation", "el", ValueType::Number(NumberRange::between(0.0, 90.0)))
        .aliases(&["el"])
        .modifies("drop_shadow")
        .default_value(DEFAULT_SHADOW_ELEVATION),
    ParameterSpec::new("saturation", "st", ValueType::Number(NumberRange::between(0.0, 100.0)))
        .aliases(&["st"])
        .modifies("drop_shadow")
        .default_value(DEFAULT_SHADOW_SATURATION),
    ParameterSpec::new(
        "change_background",
        "e-changebg",
        ValueType::Prompt(PromptRequirement::Required),
    )
    .aliases(&["e-changebg"])
    .ai()
    .describe("Replace the background from a text prompt"),
    ParameterSpec::new("edit", "e-edit", ValueType::Prompt(PromptRequirement::Required))
        .aliases(&["e-edit"])
        .ai()
        .describe("Edit the image from a text prompt"),
    ParameterSpec::new(
        "generative_fill",
        "bg-genfill",
        ValueType::Prompt(PromptRequirement::Optional),
    )
    .aliases(&["bg-genfill"])
    .ai()
    .requires(&[Requirement::always(&[
        Companion::code("w"),
        Companion::code("h"),
        Companion::one_of("cm", &["pad_resize"]),
    ])])
    .conflicts(&[Conflict::reject(&[Companion::code("bg")])])
    .describe("Extend the canvas with generated content"),
    ParameterSpec::new("retouch", "e-retouch", ValueType::Flag)
        .aliases(&["e-retouch"])
        .ai()
        .max_megapixels(AI_ENHANCE_MAX_MEGAPIXELS),
    ParameterSpec::new("upscale", "e-upscale", ValueType::Flag)
        .aliases(&["e-upscale"])
        .ai()
        .max_megapixels(AI_ENHANCE_MAX_MEGAPIXELS),
    ParameterSpec::new("generate_variation", "e-genvar", ValueType::Flag)
        .aliases(&["e-genvar"])
        .ai(),
    ParameterSpec::new(
        "generate_image",
        "ik-genimg",
        ValueType::Prompt(PromptRequirement::Required),
    )
    .aliases(&["ik-genimg"])
    .ai()
    .path_only()
    .describe("Generate a new image from a prompt; lives in the URL path"),
];

/// Overlay positioning parameters, only valid inside a layer token.
pub static LAYER_CATALOG: &[ParameterSpec] = &[
    ParameterSpec::new("layer_x", "lx", ValueType::ArithmeticExpression(NumberRange::ANY)),
    ParameterSpec::new("layer_y", "ly", ValueType::ArithmeticExpression(NumberRange::ANY)),
    ParameterSpec::new("layer_focus", "lfo", ValueType::Enum(LAYER_FOCUS_VALUES)),
];

/// Styling parameters of a text overlay.
pub static TEXT_LAYER_CATALOG: &[ParameterSpec] = &[
    ParameterSpec::new("width", "w", ValueType::ArithmeticExpression(NumberRange::positive()))
        .describe("Text box width; longer text wraps"),
    ParameterSpec::new("font_size", "fs", ValueType::ArithmeticExpression(NumberRange::positive())),
    ParameterSpec::new("font_family", "ff", ValueType::Font(FONT_FAMILIES)),
    ParameterSpec::new("color", "co", ValueType::Color(&[])),
    ParameterSpec::new("inner_alignment", "ia", ValueType::Enum(&["left", "center", "right"])),
    ParameterSpec::new("padding", "pa", ValueType::Padding),
    ParameterSpec::new("alpha", "al", ValueType::Number(NumberRange::between(1.0, 9.0).whole())),
    ParameterSpec::new("typography", "tg", ValueType::Enum(TYPOGRAPHY_VALUES)),
    ParameterSpec::new("background", "bg", ValueType::Color(&["dominant"])),
    ParameterSpec::new(
        "radius",
        "r",
        ValueType::ArithmeticExpression(NumberRange::positive().with_keywords(&["max"])),
    ),
    ParameterSpec::new(
        "rotation",
        "rt",
        ValueType::ArithmeticExpression(NumberRange::between(-360.0, 360.0)),
    ),
    ParameterSpec::new("flip", "fl", ValueType::Enum(FLIP_VALUES)),
    ParameterSpec::new("line_height", "lh", ValueType::ArithmeticExpression(NumberRange::positive())),
    ParameterSpec::new("layer_mode", "lm", ValueType::Enum(LAYER_MODE_VALUES)),
];
