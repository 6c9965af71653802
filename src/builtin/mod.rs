//! Builtin plugins.

pub mod actions;
pub mod animations;

use petal_core::Registries;

/// Creates registries populated with every builtin action, animation, and layout parameter kind.
pub fn registries() -> Registries {
    let registries = Registries::new();
    actions::register(&registries.actions);
    animations::register(&registries.animations);
    registries
}

#[test]
fn test_builtin_keys() {
    let registries = registries();
    assert_eq!(
        registries.actions.keys(),
        vec!["animationaction", "outeraction", "updatedata"]
    );
    assert_eq!(
        registries.animations.keys(),
        vec![
            "alphaanimation",
            "animationlist",
            "animationset",
            "rotateanimation",
            "scaleanimation",
            "translateanimation",
        ]
    );
    assert_eq!(registries.params.kind_for(Some("LinearLayoutParams")).name(), "linearlayoutparams");
}
