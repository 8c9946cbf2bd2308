//! Property tests for knob drags and controller state.

use proptest::prelude::*;
use sintetico_control::{
    CUTOFF_RANGE, FREQUENCY_RANGE, Knob, ListenerRegistry, Rect, RotaryInputController,
    SynthController, SynthEvent,
};
use sintetico_io::OfflineHost;

fn point() -> impl Strategy<Value = (f32, f32)> {
    (-500.0f32..500.0, -500.0f32..500.0)
}

proptest! {
    #[test]
    fn drag_values_stay_in_range(
        start in 20.0f32..2000.0,
        down in (0.0f32..=100.0, 0.0f32..=100.0),
        moves in prop::collection::vec(point(), 1..40),
    ) {
        let registry = ListenerRegistry::new();
        let mut knob = RotaryInputController::new(20.0, 2000.0, start, registry.clone());
        knob.attach(Rect::new(0.0, 0.0, 100.0, 100.0));
        knob.pointer_down(down.0, down.1).unwrap();
        for (x, y) in moves {
            let value = knob.pointer_move(x, y).unwrap();
            prop_assert!((20.0..=2000.0).contains(&value));
            prop_assert!((-135.0..=135.0).contains(&knob.angle()));
        }
        knob.pointer_up();
        prop_assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn returning_to_the_anchor_restores_the_value(
        start in 20.0f32..2000.0,
        down_angle in -3.1f32..3.1,
        away_angle in -0.5f32..0.5,
    ) {
        // A small excursion that never saturates comes back to where it began.
        let registry = ListenerRegistry::new();
        let mut knob = RotaryInputController::new(20.0, 2000.0, start, registry);
        knob.attach(Rect::new(0.0, 0.0, 100.0, 100.0));
        let at = |a: f32| (50.0 + 40.0 * a.cos(), 50.0 + 40.0 * a.sin());

        let (dx, dy) = at(down_angle);
        knob.pointer_down(dx, dy).unwrap();
        let (ax, ay) = at(down_angle + away_angle);
        knob.pointer_move(ax, ay);
        let value = knob.pointer_move(dx, dy).unwrap();
        prop_assert!((value - start).abs() < 0.5, "{} vs {}", value, start);
    }

    #[test]
    fn state_frequencies_are_always_in_range(
        writes in prop::collection::vec(
            prop_oneof![
                any::<f32>().prop_map(SynthEvent::SetFrequency),
                any::<f32>().prop_map(SynthEvent::SetFilterCutoff),
            ],
            1..30,
        ),
    ) {
        let mut synth = SynthController::new(Box::new(OfflineHost::new(48000.0)));
        for event in writes {
            synth.dispatch(event);
            let f = synth.state().frequency_hz();
            let c = synth.state().filter_cutoff_hz();
            prop_assert!((FREQUENCY_RANGE.0..=FREQUENCY_RANGE.1).contains(&f));
            prop_assert!((CUTOFF_RANGE.0..=CUTOFF_RANGE.1).contains(&c));
            prop_assert!((-135.0..=135.0).contains(&synth.knob_angle(Knob::Frequency)));
            prop_assert!((-135.0..=135.0).contains(&synth.knob_angle(Knob::Cutoff)));
        }
    }
}
