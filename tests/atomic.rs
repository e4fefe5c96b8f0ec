//! An interrupt arriving at any point of the configuration must see the timer
//! either before or after an operation, never in between.

use std::cell::{Cell, RefCell};

use phase_correct_pwm::interrupt;
use phase_correct_pwm::map::{CompareOutputMode, WaveformMode, TIMER1};
use phase_correct_pwm::prelude::*;
use phase_correct_pwm::pwm::{self, Channel};
use phase_correct_pwm::sim::{SimBus, Snapshot};

/// Consistency checks an interrupt handler could rely on.
#[derive(Debug, Default)]
struct Torn {
    mode_without_top: usize,
    top_without_mode: usize,
    clock_without_mode: usize,
    pin_without_action: usize,
    action_without_pin: usize,
}

impl Torn {
    fn total(&self) -> usize {
        self.mode_without_top
            + self.top_without_mode
            + self.clock_without_mode
            + self.pin_without_action
            + self.action_without_pin
    }

    fn inspect(&mut self, snapshot: &Snapshot) {
        let tccra = snapshot.read8(TIMER1.tccra);
        let tccrb = snapshot.read8(TIMER1.tccrb);
        let mode_set = WaveformMode::from_registers(tccra, tccrb) != WaveformMode::Normal;
        let top_set = snapshot.read16(TIMER1.icr) != 0;
        let clock_set = tccrb & 0b111 != 0;

        if mode_set && !top_set {
            self.mode_without_top += 1;
        }
        if top_set && !mode_set {
            self.top_without_mode += 1;
        }
        if clock_set && !mode_set {
            self.clock_without_mode += 1;
        }

        for binding in TIMER1.channels {
            let pin = snapshot.read8(binding.ddr) & binding.pin_mask() != 0;
            let action = CompareOutputMode::from_bits(binding.com.extract(tccra))
                == CompareOutputMode::ClearUpSetDown;
            if pin && !action {
                self.pin_without_action += 1;
            }
            if action && !pin {
                self.action_without_pin += 1;
            }
        }
    }
}

#[test]
fn configuration_is_never_observed_half_applied() {
    let torn = RefCell::new(Torn::default());
    let isr = |snapshot: &Snapshot| torn.borrow_mut().inspect(snapshot);
    let bus = SimBus::with_isr(&isr);

    let mut timer = pwm::timer1(&bus, &bus);
    timer.activate_channel_b();
    timer.activate_channel_a();
    timer.activate_channel_c();

    // one deferred run per transaction: reset, setup and three activations
    assert_eq!(bus.isr_runs(), 5);
    assert!(bus.interrupts_enabled());
    assert_eq!(torn.borrow().total(), 0, "{:?}", torn.borrow());
}

#[test]
fn compare_updates_run_masked() {
    let observed = Cell::new(None);
    let isr = |snapshot: &Snapshot| observed.set(Some(snapshot.read16(0x88)));
    let bus = SimBus::with_isr(&isr);

    let mut timer = pwm::timer1(&bus, &bus);
    timer.activate_channel_a();
    let runs = bus.isr_runs();

    timer.channel(Channel::A).set_duty_cycle(0xBEEF).unwrap();

    // both bytes were written before the handler could run
    assert_eq!(bus.isr_runs(), runs + 1);
    assert_eq!(observed.get(), Some(0xBEEF));
}

#[test]
fn configuration_from_a_masked_context_stays_masked() {
    let bus = SimBus::new();
    bus.set_interrupts_enabled(false);

    let mut timer = pwm::timer1(&bus, &bus);
    timer.activate_channel_a();
    let _ = timer.state();

    assert!(!bus.interrupts_enabled());
}

#[test]
fn unprotected_writes_are_caught() {
    // the same register writes as `setup`, without an atomic section
    let torn = RefCell::new(Torn::default());
    let isr = |snapshot: &Snapshot| torn.borrow_mut().inspect(snapshot);
    let bus = SimBus::with_isr(&isr);

    bus.modify8(TIMER1.tccrb, |r| r | 0b0001_0101);
    bus.write16(TIMER1.icr, 0xFFFF);

    let torn = torn.borrow();
    assert!(torn.mode_without_top > 0);
    assert!(torn.total() > 0);
}

#[test]
fn free_masks_consumer_updates_too() {
    let torn = RefCell::new(Torn::default());
    let isr = |snapshot: &Snapshot| torn.borrow_mut().inspect(snapshot);
    let bus = SimBus::with_isr(&isr);

    interrupt::free(&bus, |_| {
        bus.write16(TIMER1.icr, 0xFFFF);
        bus.modify8(TIMER1.tccrb, |r| r | 0b0001_0101);
    });

    assert_eq!(bus.isr_runs(), 1);
    assert_eq!(torn.borrow().total(), 0);
}

#[test]
fn channel_a_setup_marks_only_channel_a() {
    let bus = SimBus::new();
    let mut timer = pwm::timer1(&bus, &bus);
    timer.activate(Channel::A);

    let snapshot = bus.snapshot();
    let tccra = snapshot.read8(TIMER1.tccra);
    assert_eq!(tccra, 0x80);
    assert_eq!(snapshot.read8(TIMER1.channels[0].ddr), 1 << 5);
}
