#[cfg(test)]
mod proptest_tag {
    use crate::tag::{Tag, TagCategory, TagSpec};
    use proptest::prelude::*;

    fn category() -> impl Strategy<Value = TagCategory> {
        prop_oneof![
            Just(TagCategory::DigitalInput),
            Just(TagCategory::DigitalOutput),
            Just(TagCategory::AnalogInput),
            Just(TagCategory::AnalogOutput),
        ]
    }

    proptest! {
        // Property: digital tags never accept units, whatever else is set.
        #[test]
        fn units_on_digital_always_rejected(
            digital in prop_oneof![Just(TagCategory::DigitalInput), Just(TagCategory::DigitalOutput)],
            units in "[a-zA-Z/%]{1,8}",
        ) {
            let mut spec = TagSpec::new("T-1", digital, "ADDR001");
            spec.units = units;
            prop_assert!(Tag::from_spec(spec).is_err());
        }

        // Property: scan settings on an output category are always rejected.
        #[test]
        fn scan_on_outputs_always_rejected(
            output in prop_oneof![Just(TagCategory::DigitalOutput), Just(TagCategory::AnalogOutput)],
            period in 1u32..3600,
        ) {
            let mut spec = TagSpec::new("T-1", output, "ADDR001");
            spec.scan_period_s = period;
            prop_assert!(Tag::from_spec(spec).is_err());
        }

        // Property: a well-formed analog input spec is always accepted and
        // its fields survive construction.
        #[test]
        fn valid_analog_input_accepted(
            low in -1000.0f64..0.0,
            span in 0.0f64..1000.0,
            period in 0u32..3600,
            enabled in any::<bool>(),
        ) {
            let mut spec = TagSpec::new("AI-1", TagCategory::AnalogInput, "ADDR001");
            spec.low_limit = low;
            spec.high_limit = low + span;
            spec.units = "u".to_string();
            spec.scan_period_s = period;
            spec.scan_enabled = enabled;

            let tag = Tag::from_spec(spec.clone()).unwrap();
            prop_assert_eq!(tag.to_spec(), spec);
        }

        // Property: whatever the category, a rejected spec never depends on
        // the description text.
        #[test]
        fn description_never_affects_validity(
            cat in category(),
            description in ".{0,32}",
        ) {
            let mut spec = TagSpec::new("T-1", cat, "ADDR001");
            spec.description = description;
            prop_assert!(Tag::from_spec(spec).is_ok());
        }
    }
}
