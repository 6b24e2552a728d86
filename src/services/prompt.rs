// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Week plan prompt rendering.

use crate::models::UserProfile;

/// Render the instruction asking the model for a 7-day task plan.
pub fn build_prompt(profile: &UserProfile) -> String {
    format!(
        r#"You are a health coach. The user is {age} years old, weighs {weight:.1} kg, is {height} cm tall,
has the goal "{goal}", an activity level of "{activity}", and the following allergies: "{allergies}".
The user wants to live a healthier lifestyle.

Please create a complete weekly fitness and nutrition plan with daily tasks for each day of the week.
The week_plan keys are the days of the week: "0" is Monday, "1" is Tuesday, "2" is Wednesday,
"3" is Thursday, "4" is Friday, "5" is Saturday and "6" is Sunday.

Each task must include:
- "title": a short name of the task
- "description": a detailed description
- "duration": estimated duration in whole minutes (a positive integer)
- "day_period": one of "morning", "noon", "afternoon", "evening", or "anytime"

Return the response strictly as a JSON object with the following format:

{{
  "week_plan": {{
    "0": [
      {{
        "title": "...",
        "description": "...",
        "duration": 10,
        "day_period": "morning"
      }}
    ],
    "1": [],
    "2": [],
    "3": [],
    "4": [],
    "5": [],
    "6": []
  }}
}}

Do not include any explanation or extra text outside the JSON.
Only output the JSON object.
"#,
        age = profile.age,
        weight = profile.weight_kg,
        height = profile.height_cm,
        goal = profile.goal,
        activity = profile.activity_level,
        allergies = profile.allergies,
    )
}
