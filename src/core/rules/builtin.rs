use crate::config::RuleSpec;
use crate::core::finding::{attrs, Category, FileKind};
use super::{MatchScope, SnippetSource};

const PLATFORM_DOCS: &str = "https://reactnative.dev/docs/platform-specific-code";
const MATERIAL_DOCS: &str = "https://material.io/design";
const DIMENSIONS_DOCS: &str = "https://reactnative.dev/docs/platform-specific-code#dimensions";
const PERMISSION_DOCS: &str = "https://developer.android.com/guide/topics/permissions/overview";
const DRAWABLE_DOCS: &str = "https://developer.android.com/guide/topics/resources/drawable-resource";
const GESTURE_DOCS: &str = "https://developer.android.com/training/gestures";
const BRIDGING_DOCS: &str = "https://reactnative.dev/docs/native-modules-android";
const PERF_DOCS: &str = "https://reactnative.dev/docs/optimizing-flatlist-configuration";
const PUSH_DOCS: &str = "https://github.com/zo0r/react-native-push-notification";

const IOS_CHECK: &str = r#"Platform\.OS\s*===?\s*['"]ios['"]"#;

/// (id, pattern, pattern_type, suggested_android, remediation)
const UI_PATTERNS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "ui.tab_bar_ios",
        r"\bTabBarIOS\b",
        "TabBar",
        "BottomNavigationView",
        "Replace TabBarIOS with a bottom tab navigator rendered as BottomNavigationView on Android.",
    ),
    (
        "ui.navigation_controller",
        r"\bNavigationController\b",
        "NavigationController",
        "NavigationDrawer (React Navigation)",
        "Model the NavigationController stack with React Navigation and a NavigationDrawer on Android.",
    ),
    (
        "ui.modal",
        r"(?i)<Modal\b",
        "Modal",
        "DialogFragment/AlertDialog",
        "Present the modal as a DialogFragment/AlertDialog on Android and handle the back button via onRequestClose.",
    ),
];

/// (library, Android equivalent and docs when one is known)
const IOS_ONLY_LIBRARIES: &[(&str, Option<(&str, &str)>)] = &[
    (
        "react-native-push-notification-ios",
        Some(("react-native-push-notification", PUSH_DOCS)),
    ),
    (
        "@react-native-community/push-notification-ios",
        Some(("react-native-push-notification", PUSH_DOCS)),
    ),
    (
        "react-native-permissions/ios",
        Some((
            "react-native-permissions (with Android setup)",
            "https://github.com/zoontek/react-native-permissions",
        )),
    ),
    ("react-native-navigation/ios", None),
];

/// (id, pattern, api_name, ios_usage, android_considerations, docs)
const API_BEHAVIOR: &[(&str, &str, &str, &str, &str, &str)] = &[
    (
        "api.push_notification_ios",
        r"\bPushNotificationIOS\b",
        "PushNotificationIOS",
        "Used for iOS push notifications.",
        "Use react-native-push-notification for Android and ensure FCM or a similar service is integrated.",
        PUSH_DOCS,
    ),
    (
        "api.geolocation",
        r"\bGeolocation\.getCurrentPosition\b|\bnavigator\.geolocation\b",
        "Geolocation",
        "Used for location on iOS.",
        "Add ACCESS_FINE_LOCATION permission in AndroidManifest and request runtime permissions.",
        "https://reactnative.dev/docs/geolocation",
    ),
    (
        "api.camera_roll",
        r"\bCameraRoll\b",
        "CameraRoll",
        "Used to access photos on iOS.",
        "Request READ_EXTERNAL_STORAGE permission on Android. Consider react-native-cameraroll for cross-platform usage.",
        "https://github.com/react-native-cameraroll/react-native-cameraroll",
    ),
    (
        "api.react_native_fs",
        r"react-native-fs",
        "react-native-fs",
        "Used for file operations on iOS.",
        "Add WRITE_EXTERNAL_STORAGE permission and handle scoped storage on Android.",
        "https://github.com/itinance/react-native-fs",
    ),
];

/// (id, Info.plist key, Android permission)
const PERMISSIONS: &[(&str, &str, &str)] = &[
    ("permission.camera", "NSCameraUsageDescription", "android.permission.CAMERA"),
    (
        "permission.location_when_in_use",
        "NSLocationWhenInUseUsageDescription",
        "android.permission.ACCESS_FINE_LOCATION",
    ),
    (
        "permission.location_always",
        "NSLocationAlwaysAndWhenInUseUsageDescription",
        "android.permission.ACCESS_BACKGROUND_LOCATION",
    ),
    (
        "permission.photo_library",
        "NSPhotoLibraryUsageDescription",
        "android.permission.READ_EXTERNAL_STORAGE",
    ),
    ("permission.microphone", "NSMicrophoneUsageDescription", "android.permission.RECORD_AUDIO"),
    ("permission.contacts", "NSContactsUsageDescription", "android.permission.READ_CONTACTS"),
    (
        "permission.bluetooth",
        "NSBluetoothAlwaysUsageDescription",
        "android.permission.BLUETOOTH_CONNECT",
    ),
    ("permission.face_id", "NSFaceIDUsageDescription", "android.permission.USE_BIOMETRIC"),
];

/// (id, iOS scale suffix, Android drawable bucket)
const ASSET_SCALES: &[(&str, &str, &str)] = &[
    ("asset.scale_2x", "@2x", "drawable-hdpi"),
    ("asset.scale_3x", "@3x", "drawable-xxhdpi"),
    ("asset.scale_4x", "@4x", "drawable-xxxhdpi"),
];

/// (id, pattern, Android equivalent)
const GESTURES: &[(&str, &str, &str)] = &[
    ("gesture.force_touch", r"(?i)\bforce touch\b", "force touch -> long-press on Android"),
    (
        "gesture.3d_touch",
        r"(?i)\b3D Touch\b",
        "3D Touch -> long-press or contextual menu on Android",
    ),
];

/// (id, pattern, remediation)
const PERFORMANCE: &[(&str, &str, &str)] = &[
    (
        "performance.request_animation_frame",
        "requestAnimationFrame",
        "Batch frame callbacks or defer the work with InteractionManager.runAfterInteractions.",
    ),
    (
        "performance.animated_timing",
        "Animated.timing",
        "Consolidate Animated.timing calls and enable useNativeDriver.",
    ),
];

/// (id, pattern, hardware_type, recommendation)
const HARDWARE: &[(&str, &str, &str, &str)] = &[
    (
        "hardware.face_id",
        r"\bFaceID\b",
        "FaceID",
        "Use react-native-biometrics for cross-platform biometric authentication.",
    ),
    (
        "hardware.touch_id",
        r"\bTouchID\b",
        "TouchID",
        "Use react-native-biometrics for cross-platform biometric authentication.",
    ),
    (
        "hardware.biometric",
        r"react-native-(?:fingerprint-scanner|biometrics|face-id)",
        "Biometric",
        "Use react-native-biometrics or Expo Local Authentication.",
    ),
    (
        "hardware.camera",
        r"react-native-camera|expo-camera",
        "Camera",
        "Use react-native-camera or Expo Camera for cross-platform camera functionality.",
    ),
    (
        "hardware.sensor",
        r"react-native-sensors",
        "Sensor",
        "Use react-native-sensors for cross-platform sensor access.",
    ),
    (
        "hardware.gps",
        r"Geolocation|react-native-geolocation-service",
        "GPS",
        "Use react-native-geolocation-service for cross-platform GPS access.",
    ),
    (
        "hardware.bluetooth",
        r"react-native-(?:bluetooth-classic|ble-plx|bluetooth-serial)",
        "Bluetooth",
        "Use react-native-ble-plx for modern Bluetooth connections.",
    ),
    (
        "hardware.nfc",
        r"react-native-nfc-manager",
        "NFC",
        "Use react-native-nfc-manager for NFC integration.",
    ),
    (
        "hardware.network_terminal",
        r"(?:socket\.io|websockets|fetch|axios).*SAT_PIN|CASH_DRAWER",
        "Network Communication",
        "Ensure SAT PIN terminals and cash drawers support secure communication protocols.",
    ),
    (
        "hardware.printer",
        r"zebra|react-native-zebra",
        "Printers",
        "Use react-native-zebra for Zebra printer integration or alternatives compatible with Android.",
    ),
];

/// Hardware types that only exist on iOS devices
const IOS_ONLY_HARDWARE: &[&str] = &["FaceID"];

/// The built-in rule table, in evaluation order
pub(super) fn specs() -> Vec<RuleSpec> {
    let mut specs = Vec::new();

    for (id, pattern, pattern_type, suggested, remediation) in UI_PATTERNS {
        specs.push(
            RuleSpec::new(id, Category::UiPattern, MatchScope::Line, pattern)
                .remediation(remediation)
                .docs(PLATFORM_DOCS)
                .attr(attrs::PATTERN_TYPE, pattern_type)
                .attr(attrs::SUGGESTED_ANDROID, suggested),
        );
    }

    for (id, pattern, api_name, ios_usage, considerations, docs) in API_BEHAVIOR {
        specs.push(
            RuleSpec::new(id, Category::ApiBehavior, MatchScope::FileFirst, pattern)
                .remediation(considerations)
                .docs(docs)
                .attr(attrs::API_NAME, api_name)
                .attr(attrs::IOS_USAGE, ios_usage),
        );
    }

    for (id, key, android) in PERMISSIONS {
        specs.push(
            RuleSpec::new(id, Category::Permission, MatchScope::FileFirst, key)
                .literal()
                .kinds(&[FileKind::PropertyList])
                .remediation(&format!(
                    "Add <uses-permission android:name=\"{}\"/> to AndroidManifest.xml",
                    android
                ))
                .docs(PERMISSION_DOCS)
                .attr(attrs::ANDROID_PERMISSION, android),
        );
    }

    specs.push(
        RuleSpec::new("platform.ios_check", Category::PlatformIssue, MatchScope::Line, IOS_CHECK)
            .snippet(SnippetSource::Line)
            .remediation("Add the matching Android branch or collapse both with Platform.select.")
            .docs(PLATFORM_DOCS),
    );
    for (library, equivalent) in IOS_ONLY_LIBRARIES {
        let slug = library
            .trim_start_matches('@')
            .replace(|c: char| !c.is_ascii_alphanumeric(), "_");
        let pattern = format!(
            r#"import\s+.*?from\s+['"]([^'"]*{}[^'"]*)['"]"#,
            regex::escape(library)
        );
        let spec = RuleSpec::new(
            &format!("platform.ios_library.{}", slug),
            Category::PlatformIssue,
            MatchScope::Line,
            &pattern,
        )
        .snippet(SnippetSource::Capture(1));

        specs.push(match equivalent {
            Some((android, docs)) => spec
                .remediation(&format!(
                    "Replace {} with {} for Android compatibility.",
                    library, android
                ))
                .docs(docs)
                .attr(attrs::ANDROID_EQUIVALENT, android),
            None => spec.remediation(
                "{1} is iOS-only and has no known Android equivalent. Check community resources or official docs.",
            ),
        });
    }

    for (id, scale, bucket) in ASSET_SCALES {
        let pattern = format!(r"^(.+){}(\.\w+)$", regex::escape(scale));
        specs.push(
            RuleSpec::new(id, Category::Asset, MatchScope::FileName, &pattern)
                .kinds(&[FileKind::Image])
                .remediation(&format!("Place a scaled version of {{1}}{{2}} in {} folder.", bucket))
                .docs(DRAWABLE_DOCS)
                .attr(attrs::IOS_VARIANT, scale)
                .attr(attrs::ASSET_TYPE, "image"),
        );
    }

    specs.push(
        RuleSpec::new(
            "native.objc_source",
            Category::NativeModule,
            MatchScope::FileName,
            r"^.+\.(?:m|mm)$",
        )
        .kinds(&[FileKind::NativeSource])
        .path_filter(r"(?i)(^|/)ios/")
        .remediation("Refer to React Native docs for Android native modules.")
        .docs(BRIDGING_DOCS)
        .attr(attrs::ANDROID_EQUIVALENT, "Create Android native module in Java/Kotlin"),
    );
    specs.push(
        RuleSpec::new(
            "native.exported_module",
            Category::NativeModule,
            MatchScope::Line,
            r"RCT_EXPORT_MODULE\(\s*\w*\s*\)",
        )
        .kinds(&[FileKind::NativeSource])
        .remediation("Expose the same module name from a ReactContextBaseJavaModule on Android.")
        .docs(BRIDGING_DOCS)
        .attr(attrs::ANDROID_EQUIVALENT, "ReactContextBaseJavaModule"),
    );
    specs.push(
        RuleSpec::new(
            "native.cocoapod",
            Category::NativeModule,
            MatchScope::Line,
            r#"^\s*pod\s+['"]([^'"]+)['"]"#,
        )
        .kinds(&[FileKind::Manifest])
        .path_filter(r"(^|/)Podfile$")
        .snippet(SnippetSource::Capture(1))
        .remediation("Find an Android counterpart for the {1} pod (Gradle dependency or React Native package).")
        .docs(BRIDGING_DOCS),
    );

    for (id, pattern, equivalent) in GESTURES {
        specs.push(
            RuleSpec::new(id, Category::GestureMapping, MatchScope::FileFirst, pattern)
                .remediation("Replace iOS-specific gesture with Android-friendly alternative.")
                .docs(GESTURE_DOCS)
                .attr(attrs::ANDROID_EQUIVALENT, equivalent),
        );
    }

    for (id, pattern, remediation) in PERFORMANCE {
        specs.push(
            RuleSpec::new(id, Category::PerformanceIssue, MatchScope::Density(5), pattern)
                .literal()
                .remediation(remediation)
                .docs(PERF_DOCS),
        );
    }

    for (id, pattern, hardware_type, recommendation) in HARDWARE {
        let platform = if IOS_ONLY_HARDWARE.contains(hardware_type) {
            "iOS Specific"
        } else {
            "Compatible with Android"
        };
        specs.push(
            RuleSpec::new(id, Category::HardwareDependency, MatchScope::Line, pattern)
                .remediation(recommendation)
                .attr(attrs::HARDWARE_TYPE, hardware_type)
                .attr(attrs::PLATFORM_SPECIFIC, platform),
        );
    }

    specs.push(
        RuleSpec::new(
            "dependency.import",
            Category::Dependency,
            MatchScope::FileAll,
            r#"(?m)^[ \t]*import\s+(?:[\w*{}\s,$]+?\s+from\s+)?['"]([^'"]+)['"]"#,
        )
        .snippet(SnippetSource::Capture(1))
        .attr(attrs::DEPENDENCY_TYPE, "import"),
    );
    specs.push(
        RuleSpec::new(
            "dependency.require",
            Category::Dependency,
            MatchScope::FileAll,
            r#"\brequire\(\s*['"]([^'"]+)['"]\s*\)"#,
        )
        .snippet(SnippetSource::Capture(1))
        .attr(attrs::DEPENDENCY_TYPE, "require"),
    );

    specs.push(
        RuleSpec::new(
            "api_call.fetch",
            Category::ApiCall,
            MatchScope::FileAll,
            r#"\bfetch\(\s*['"`]([^'"`\n]+)['"`](?:[^;]*?method:\s*['"](\w+)['"])?"#,
        )
        .snippet(SnippetSource::Capture(1))
        .attr(attrs::METHOD, "{2:upper}")
        .attr(attrs::CLIENT, "fetch"),
    );
    specs.push(
        RuleSpec::new(
            "api_call.axios",
            Category::ApiCall,
            MatchScope::FileAll,
            r#"\baxios\.(get|post|put|delete|patch)\(\s*['"`]([^'"`\n]+)['"`]"#,
        )
        .snippet(SnippetSource::Capture(2))
        .attr(attrs::METHOD, "{1:upper}")
        .attr(attrs::CLIENT, "axios"),
    );
    specs.push(
        RuleSpec::new(
            "api_call.http_client",
            Category::ApiCall,
            MatchScope::FileAll,
            r#"\b(\w+)\.(get|post|put|delete|patch)\(\s*['"`]((?:https?://|/)[^'"`\n]*)['"`]"#,
        )
        .snippet(SnippetSource::Capture(3))
        .attr(attrs::METHOD, "{2:upper}")
        .attr(attrs::CLIENT, "{1}"),
    );

    specs.push(
        RuleSpec::new(
            "styling.hardcoded_size",
            Category::DeviceStyling,
            MatchScope::Line,
            r"\b(height|width|margin|padding|top|left|right|bottom)\s*:\s*(\d+)\b",
        )
        .remediation("Replace {1}: {2} with scalable units (Dimensions API or react-native-size-matters).")
        .docs(DIMENSIONS_DOCS),
    );
    specs.push(
        RuleSpec::new("styling.ios_condition", Category::DeviceStyling, MatchScope::Line, IOS_CHECK)
            .snippet(SnippetSource::Line)
            .remediation(
                "Use platform-agnostic Material Design components or conditional platform checks with equivalent Android design.",
            )
            .docs(MATERIAL_DOCS),
    );

    specs
}
