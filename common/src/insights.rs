// Copyright (c) 2026 OverTheFlow and Contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file, You can obtain one at
// https://mozilla.org/MPL/2.0/.

use rand::seq::SliceRandom;
use rand::{Rng, rng};

/// Usage hints shown while waiting on the remote service.
const USAGE_TIPS: &[&str] = &[
    "Add -s to save a screenshot of the interpreted page",
    "Add -d to include every destination the page contacted",
    "Already have a result link? Pass it with --url",
    "Use --max-polls to stop waiting after a number of checks",
    "--noupload keeps conversion statistics on this machine",
    "Private destinations are never sent for lookup",
];

/// Networking trivia.
const TECH_TRIVIA: &[&str] = &[
    "A single page load can contact dozens of distinct destinations",
    "Zeek was called Bro until 2018",
    "The pcapng format can hold packets from several interfaces",
    "10.0.0.0/8 alone holds more than 16 million private addresses",
];

/// Industry jokes and developer humor.
const DEV_HUMOR: &[&str] = &[
    "UDP: I'd tell you a joke, but you might not get it",
    "TCP: I'll tell you a joke. Do you want to hear a joke?",
    "It's always DNS",
    "The cloud is just someone else's computer",
];

/// Generates a randomized list of spinner messages.
///
/// Every slot in the resulting list has a 50% probability of being a usage
/// tip and a 50% probability of being flavor text (trivia/humor), provided
/// both pools still have remaining items.
pub fn get_shuffled_insights() -> Vec<&'static str> {
    let mut rng = rng();

    let mut tips = USAGE_TIPS.to_vec();
    tips.shuffle(&mut rng);

    let mut flavor: Vec<&str> = TECH_TRIVIA
        .iter()
        .chain(DEV_HUMOR.iter())
        .copied()
        .collect();
    flavor.shuffle(&mut rng);

    let mut output = Vec::with_capacity(tips.len() + flavor.len());

    while !tips.is_empty() && !flavor.is_empty() {
        if rng.random_bool(0.5) {
            output.push(tips.remove(0));
        } else {
            output.push(flavor.remove(0));
        }
    }

    output.extend(tips);
    output.extend(flavor);
    output
}
