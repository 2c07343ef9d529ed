pub mod guidance_prompt;
