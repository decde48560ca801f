use crate::models::Language;

/// Build the instruction sent to the model: conversion, styling,
/// accessibility and output-format rules for `language`, followed by the
/// sanitized page markup.
pub fn build_prompt(language: Language, html: &str) -> String {
	let lang = language.as_str();
	let styling = language.styling();
	format!(
		"You are an expert front-end developer specializing in {lang} development. Your task is to \
convert, refactor, and enhance the following HTML code into a production-ready {lang} component. \
The default export must be a component named Result.

Input Requirements:
1. Analyze the provided HTML structure and functionality
2. Identify all UI components and their relationships
3. Note any existing styling patterns or design language

Conversion Guidelines:
- Convert all markup to proper {lang} syntax
- For React: Create functional components with proper JSX syntax
- For HTML/CSS: Ensure semantic HTML5 structure
- For HTML/CSS/JS: Include vanilla JavaScript for interactivity

Styling Requirements:
1. CSS Architecture:
- Use {styling} for styling
- Implement responsive design with mobile-first approach

2. Visual Enhancements:
- Apply modern UI/UX principles
- Ensure proper spacing and typography hierarchy
- Add smooth transitions for interactive elements
- Implement accessible color contrast

3. Functionality Improvements:
- Add proper event handling
- Implement error states where needed
- Ensure all interactive elements have proper states (:hover, :focus, etc.)
- Add basic form validation if applicable

Performance Considerations:
- Optimize asset loading
- Minimize DOM manipulations
- Use efficient CSS selectors
- Implement lazy loading where appropriate

Accessibility Requirements:
- ARIA attributes where needed
- Keyboard navigation support
- Screen reader compatibility
- Proper heading structure

Output Format:
- Single {lang} file with all dependencies
- Clean, well-commented code
- Organized imports/dependencies
- Proper indentation and formatting
- Only code, no additional text

Additional Notes:
- Preserve all original functionality
- Enhance where possible without changing core behavior
- Document any assumptions made
- Include TODO comments for future improvements

Here is the code to convert:
{html}

Please provide the complete refactored {lang} implementation with all necessary dependencies.
"
	)
}
